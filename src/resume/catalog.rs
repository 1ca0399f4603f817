//! Keyword catalogs and static tips for the résumé scorer.

/// Job catalogs in display order.
pub const JOB_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "analista_financeiro",
        &[
            "financeiro", "financial", "análise", "analysis", "demonstrações", "statements",
            "balanço", "balance", "dre", "fluxo de caixa", "cash flow", "orçamento", "budget",
            "planejamento", "planning", "controladoria", "controlling", "excel", "powerbi",
            "tableau", "sql", "python", "sap", "oracle", "contabilidade", "accounting",
            "auditoria", "audit", "compliance", "risco", "risk", "investimento", "investment",
        ],
    ),
    (
        "contas_pagar",
        &[
            "contas a pagar", "accounts payable", "fornecedores", "suppliers", "pagamentos",
            "payments", "conciliação", "reconciliation", "fluxo de caixa", "cash flow",
            "vencimentos", "due dates", "negociação", "negotiation", "desconto", "discount",
            "juros", "interest", "multa", "penalty", "sap", "oracle", "totvs", "protheus",
            "excel", "planilhas", "spreadsheets", "processo", "process", "rotina", "routine",
        ],
    ),
    (
        "contas_receber",
        &[
            "contas a receber", "accounts receivable", "clientes", "customers", "cobrança",
            "collection", "inadimplência", "default", "crédito", "credit", "análise de crédito",
            "credit analysis", "limite", "limit", "faturamento", "billing", "nota fiscal",
            "invoice", "recebimentos", "receipts", "conciliação", "reconciliation", "spc",
            "serasa", "protesto", "protest", "negociação", "negotiation", "acordo", "agreement",
        ],
    ),
    (
        "analista_precificacao",
        &[
            "precificação", "pricing", "preço", "price", "margem", "margin", "custo", "cost",
            "markup", "competitividade", "competitiveness", "mercado", "market", "pesquisa",
            "research", "análise", "analysis", "estratégia", "strategy", "produto", "product",
            "serviço", "service", "valor", "value", "elasticidade", "elasticity", "demanda",
            "demand", "oferta", "supply", "concorrência", "competition", "benchmark",
        ],
    ),
    (
        "custos",
        &[
            "custos", "costs", "custeio", "costing", "abc", "activity based costing",
            "centro de custo", "cost center", "rateio", "allocation", "apropriação",
            "appropriation", "variação", "variance", "padrão", "standard", "orçamento",
            "budget", "controle", "control", "redução", "reduction", "otimização",
            "optimization", "eficiência", "efficiency", "produtividade", "productivity",
            "margem", "margin", "rentabilidade", "profitability", "break even",
        ],
    ),
];

pub const TECHNICAL_SKILLS: &[&str] = &[
    "excel", "powerbi", "tableau", "sql", "python", "sap", "oracle", "totvs", "protheus",
    "microsiga", "senior", "datasul", "logix", "access", "vba",
];

pub const SOFT_SKILLS: &[&str] = &[
    "comunicação", "communication", "liderança", "leadership", "trabalho em equipe",
    "teamwork", "organização", "organization", "proatividade", "proactive", "analítico",
    "analytical", "detalhista", "detail oriented", "responsabilidade", "responsibility",
    "pontualidade", "punctuality", "flexibilidade", "flexibility",
];

pub const DEGREE_MARKERS: &[&str] = &[
    "graduação", "graduado", "bacharel", "licenciatura", "superior completo", "formado em",
    "degree", "bachelor", "graduated",
];

pub const POSTGRAD_MARKERS: &[&str] = &[
    "pós-graduação", "pós graduação", "especialização", "postgraduate", "especialista em",
    "graduate certificate",
];

pub const MBA_MARKERS: &[&str] = &["mba", "master of business administration", "mestrado profissional"];

pub const RELEVANT_AREAS: &[&str] = &[
    "administração", "economia", "contabilidade", "ciências contábeis", "engenharia",
    "matemática", "estatística", "finanças", "business", "accounting", "economics", "finance",
    "engineering", "mathematics",
];

pub const STOP_WORDS: &[&str] = &[
    "ante", "após", "até", "com", "contra", "desde", "entre", "para", "perante", "por",
    "sem", "sob", "sobre", "trás", "das", "dos", "nas", "nos", "pela", "pelas", "pelo",
    "pelos", "num", "numa", "uma", "umas", "uns", "que", "quem", "qual", "quais", "cujo",
    "cuja", "onde", "quando", "como", "porque", "pois", "mas", "porém", "também", "já",
    "não", "sim", "mais", "menos", "muito", "muitos", "muita", "muitas", "pouco", "ele",
    "ela", "eles", "elas", "você", "vocês", "nós", "lhe", "lhes", "meu", "minha", "meus",
    "minhas", "seu", "sua", "seus", "suas", "nosso", "nossa", "nossos", "nossas", "dele",
    "dela", "deles", "delas", "este", "esta", "estes", "estas", "esse", "essa", "esses",
    "essas", "aquele", "aquela", "aqueles", "aquelas", "isto", "isso", "aquilo", "ser",
    "sou", "era", "eram", "foi", "foram", "fui", "sido", "são", "está", "estão", "estava",
    "estavam", "estive", "esteve", "ter", "tem", "têm", "tinha", "tinham", "tive", "teve",
    "tenho", "haver", "há", "houve", "havia", "seja", "sejam", "fosse", "fossem", "será",
    "serão", "seria", "seriam", "mesmo", "mesma", "outro", "outra", "outros", "outras",
    "cada", "todo", "toda", "todos", "todas", "tudo", "nada", "algum", "alguma", "alguns",
    "algumas", "nem", "ainda", "depois", "antes", "aqui", "ali", "lá", "entre", "num",
];

/// Static guidance served next to the analysis.
pub const ANALYSIS_TIPS: &[(&str, &[&str])] = &[
    (
        "general",
        &[
            "Use palavras-chave específicas da área financeira",
            "Quantifique seus resultados sempre que possível",
            "Destaque experiências com sistemas ERP (SAP, Oracle, TOTVS)",
            "Mencione conhecimentos em Excel avançado e ferramentas de BI",
            "Inclua certificações relevantes (CRC, CFA, etc.)",
        ],
    ),
    (
        "analista_financeiro",
        &[
            "Destaque experiências com análise de demonstrações financeiras",
            "Mencione conhecimentos em planejamento e controle orçamentário",
            "Inclua experiências com análise de investimentos",
            "Destaque habilidades em modelagem financeira",
        ],
    ),
    (
        "contas_pagar",
        &[
            "Enfatize experiências com gestão de fornecedores",
            "Mencione conhecimentos em fluxo de caixa",
            "Destaque habilidades em negociação de prazos e descontos",
            "Inclua experiências com conciliação bancária",
        ],
    ),
    (
        "contas_receber",
        &[
            "Destaque experiências com análise de crédito",
            "Mencione conhecimentos em cobrança e recuperação",
            "Inclua experiências com gestão de inadimplência",
            "Enfatize habilidades em negociação",
        ],
    ),
    (
        "analista_precificacao",
        &[
            "Destaque experiências com análise de mercado",
            "Mencione conhecimentos em estratégias de pricing",
            "Inclua experiências com análise de competitividade",
            "Enfatize habilidades analíticas e de pesquisa",
        ],
    ),
    (
        "custos",
        &[
            "Destaque experiências com custeio ABC",
            "Mencione conhecimentos em centro de custos",
            "Inclua experiências com análise de variações",
            "Enfatize habilidades em otimização de processos",
        ],
    ),
];

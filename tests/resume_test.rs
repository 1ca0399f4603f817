/// Résumé scorer end to end: upload dispatch plus scoring of realistic text.
use apply_scout::resume::{analyze, extract_text, ResumeError};

const FINANCE_CV: &str = "Maria Souza
Analista Financeira com 6 anos de experiência em controladoria, orçamento e fluxo de caixa.
Bacharel em Ciências Contábeis; pós-graduação em Finanças Corporativas.
Ferramentas: Excel avançado, Power BI, SQL, SAP e TOTVS.
Responsável pela análise de demonstrações financeiras, DRE e balanço patrimonial.
Perfil analítico, comunicação clara, liderança de equipe e organização.";

#[test]
fn test_finance_resume_scores_highest_on_finance() {
    let text = extract_text("maria.txt", FINANCE_CV.as_bytes()).unwrap();
    let a = analyze(&text).unwrap();
    println!("📊 job scores: {:?}", a.job_scores);

    let finance = a.job_scores["analista_financeiro"];
    let receivable = a.job_scores["contas_receber"];
    assert!(finance > receivable, "❌ FAIL: {} <= {}", finance, receivable);
    assert_eq!(a.job_scores.len(), 5);
    assert_eq!(a.star_ratings.len(), 5);

    assert_eq!(a.experience_years, 6);
    assert_eq!(a.experience_level, "Sênior");
    assert!(a.education.superior_completo);
    assert!(a.education.pos_graduacao);
    assert!(!a.education.mba);
    assert!(a.education.area_relevante);
    assert!(a.technical_score > 0.0);
    assert!(a.soft_skills_score > 0.0);
    assert!(a.overall_rating >= 0.0 && a.overall_rating <= 5.0);

    // A postgraduate senior profile earns no education nudges.
    assert!(!a.recommendations.iter().any(|r| r.contains("curso superior")));
    assert!(!a.recommendations.iter().any(|r| r.contains("pós-graduação ou MBA")));
}

#[test]
fn test_thin_resume_gets_guidance() {
    let a = analyze("Estudante procurando primeira oportunidade em escritório.").unwrap();
    assert_eq!(a.experience_years, 0);
    assert!(a.recommendations.iter().any(|r| r.contains("estágios")));
    assert!(a.recommendations.iter().any(|r| r.contains("curso superior")));
    assert!(a.recommendations.iter().any(|r| r.contains("Excel avançado")));
}

#[test]
fn test_upload_formats() {
    assert!(matches!(extract_text("cv.doc", b"binary"), Err(ResumeError::WordDocument)));
    assert!(matches!(extract_text("cv", b"text"), Err(ResumeError::UnsupportedFormat(_))));
    assert_eq!(extract_text("notes.md", "# CV\nSAP".as_bytes()).unwrap(), "# CV\nSAP");
}

// In-page JavaScript used by the CDP driver.
//
// Every function is an expression `function(...) {...}` invoked through
// [`invoke`], which JSON-encodes the arguments so no selector or value is
// ever spliced into source text.

/// Resolve `css` (optionally filtered by caption needles) inside `scope`,
/// tag the hit with `data-as-ref` and return a selector for it, or `null`.
pub const RESOLVE: &str = r#"function(scopeSel, css, needles) {
  try {
    var root = scopeSel ? document.querySelector(scopeSel) : document;
    if (!root) return null;
    var nodes = Array.prototype.slice.call(root.querySelectorAll(css));
    if (needles && needles.length) {
      nodes = nodes.filter(function (el) {
        var t = ((el.innerText || el.textContent || '') + ' ' + (el.getAttribute('aria-label') || '')).toLowerCase();
        return needles.some(function (n) { return t.indexOf(n) !== -1; });
      });
    }
    if (!nodes.length) return null;
    var visible = nodes.filter(function (el) { return el.getClientRects().length > 0; });
    var el = visible.length ? visible[0] : nodes[0];
    var ref = el.getAttribute('data-as-ref');
    if (!ref) {
      window.__asRef = (window.__asRef || 0) + 1;
      ref = String(window.__asRef);
      el.setAttribute('data-as-ref', ref);
    }
    return '[data-as-ref="' + ref + '"]';
  } catch (e) {
    return null;
  }
}"#;

/// `true` when the element's centre point hits the element itself (or a
/// descendant); `false` when something overlays it.
pub const HIT_TEST: &str = r#"function(sel) {
  var el = document.querySelector(sel);
  if (!el) return false;
  var r = el.getBoundingClientRect();
  if (r.width === 0 || r.height === 0) return false;
  var hit = document.elementFromPoint(r.left + r.width / 2, r.top + r.height / 2);
  return !!hit && (hit === el || el.contains(hit));
}"#;

pub const SCROLL_INTO_VIEW: &str = r#"function(sel) {
  var el = document.querySelector(sel);
  if (!el) return false;
  el.scrollIntoView({ block: 'center', inline: 'center' });
  return true;
}"#;

pub const SCRIPT_CLICK: &str = r#"function(sel) {
  var el = document.querySelector(sel);
  if (!el) return false;
  el.click();
  return true;
}"#;

pub const DISPATCH_CLICK: &str = r#"function(sel) {
  var el = document.querySelector(sel);
  if (!el) return false;
  ['mousedown', 'mouseup', 'click'].forEach(function (type) {
    el.dispatchEvent(new MouseEvent(type, { bubbles: true, cancelable: true, view: window }));
  });
  return true;
}"#;

pub const TEXT: &str = r#"function(sel) {
  var el = document.querySelector(sel);
  return el ? (el.innerText || el.textContent || '') : null;
}"#;

pub const OUTER_HTML: &str = r#"function(sel) {
  var el = document.querySelector(sel);
  return el ? el.outerHTML : null;
}"#;

pub const CLEAR: &str = r#"function(sel) {
  var el = document.querySelector(sel);
  if (!el) return false;
  el.focus();
  var proto = el.tagName === 'TEXTAREA' ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype;
  var setter = Object.getOwnPropertyDescriptor(proto, 'value').set;
  setter.call(el, '');
  el.dispatchEvent(new Event('input', { bubbles: true }));
  return true;
}"#;

pub const SCROLL_CONTAINER: &str = r#"function(sel, to) {
  var el = document.querySelector(sel);
  if (!el) return false;
  function scrollable(n) {
    if (n.scrollHeight <= n.clientHeight) return false;
    var oy = window.getComputedStyle(n).overflowY;
    return oy === 'auto' || oy === 'scroll';
  }
  var target = scrollable(el) ? el : null;
  if (!target) {
    var all = el.querySelectorAll('*');
    for (var i = 0; i < all.length; i++) {
      if (scrollable(all[i])) { target = all[i]; break; }
    }
  }
  target = target || el;
  if (to === 'top') target.scrollTop = 0;
  else if (to === 'bottom') target.scrollTop = target.scrollHeight;
  else target.scrollTop = target.scrollTop + 400;
  return true;
}"#;

pub const SCROLL_PAGE: &str = r#"function(dy) {
  window.scrollBy({ top: dy, behavior: 'smooth' });
  return true;
}"#;

/// Snapshot of every question control inside the modal.
pub const SCAN_FIELDS: &str = r#"function(modalSel) {
  var modal = document.querySelector(modalSel);
  if (!modal) return [];
  function ref(el) {
    var r = el.getAttribute('data-as-ref');
    if (!r) {
      window.__asRef = (window.__asRef || 0) + 1;
      r = String(window.__asRef);
      el.setAttribute('data-as-ref', r);
    }
    return '[data-as-ref="' + r + '"]';
  }
  function visible(el) { return el.getClientRects().length > 0; }
  function labelText(el) {
    var parts = [];
    if (el.id) {
      var l = modal.querySelector('label[for="' + CSS.escape(el.id) + '"]');
      if (l) parts.push(l.innerText);
    }
    var wrap = el.closest('label');
    if (wrap) parts.push(wrap.innerText);
    ['aria-label', 'placeholder', 'name', 'id', 'title'].forEach(function (a) {
      var v = el.getAttribute(a);
      if (v) parts.push(v);
    });
    return parts.join(' ').replace(/\s+/g, ' ').trim();
  }
  var out = [];
  modal.querySelectorAll('select').forEach(function (s) {
    if (!visible(s)) return;
    var cur = s.options[s.selectedIndex];
    out.push({
      key: ref(s), kind: 'select', label: labelText(s),
      value: cur ? (cur.text || '').trim() : '',
      options: Array.prototype.map.call(s.options, function (o) {
        return { key: o.value, value: o.value, text: (o.text || '').trim(), selected: o.selected };
      })
    });
  });
  var groups = {};
  modal.querySelectorAll('input[type=radio], input[type=checkbox]').forEach(function (i) {
    var box = i.closest('fieldset') || i.parentElement;
    var gk = i.name || ref(box);
    if (!groups[gk]) {
      var legend = box.querySelector('legend');
      groups[gk] = {
        key: ref(box), kind: i.type === 'radio' ? 'radio' : 'checkbox',
        label: ((legend && legend.innerText) || box.getAttribute('aria-label') || i.name || '').replace(/\s+/g, ' ').trim(),
        value: '', options: []
      };
      out.push(groups[gk]);
    }
    var l = i.id ? modal.querySelector('label[for="' + CSS.escape(i.id) + '"]') : null;
    var text = ((l && l.innerText) || i.getAttribute('aria-label') || i.value || '').trim();
    if (i.checked) groups[gk].value = text;
    groups[gk].options.push({ key: ref(i), value: i.value || '', text: text, selected: i.checked });
  });
  var textual = 'input:not([type]), input[type=text], input[type=tel], input[type=email], input[type=number], textarea';
  modal.querySelectorAll(textual).forEach(function (el) {
    if (!visible(el) || el.disabled || el.readOnly) return;
    var kind = el.tagName === 'TEXTAREA' ? 'text_area' : (el.type === 'number' ? 'number' : 'text');
    out.push({ key: ref(el), kind: kind, label: labelText(el), value: el.value || '', options: [] });
  });
  return out;
}"#;

/// Applies a non-typed fill (`select_option`, `check`, `set_number`).
pub const APPLY_FILL: &str = r#"function(f) {
  var el = document.querySelector(f.key);
  if (!el) return false;
  function fire(n) {
    n.dispatchEvent(new Event('input', { bubbles: true }));
    n.dispatchEvent(new Event('change', { bubbles: true }));
    n.dispatchEvent(new Event('blur', { bubbles: true }));
  }
  if (f.action === 'select_option') {
    el.value = f.value;
    fire(el);
    return el.value === f.value;
  }
  if (f.action === 'check') {
    if (!el.checked) el.click();
    return !!el.checked;
  }
  if (f.action === 'set_number') {
    var setter = Object.getOwnPropertyDescriptor(HTMLInputElement.prototype, 'value').set;
    setter.call(el, f.value);
    fire(el);
    return true;
  }
  return false;
}"#;

/// Visible inline validation errors and the input each one belongs to.
pub const SCAN_ERRORS: &str = r#"function(modalSel) {
  var modal = document.querySelector(modalSel);
  if (!modal) return [];
  function ref(el) {
    var r = el.getAttribute('data-as-ref');
    if (!r) {
      window.__asRef = (window.__asRef || 0) + 1;
      r = String(window.__asRef);
      el.setAttribute('data-as-ref', r);
    }
    return '[data-as-ref="' + r + '"]';
  }
  var inputs = Array.prototype.slice.call(modal.querySelectorAll('input, textarea, select'));
  var nodes = modal.querySelectorAll('.artdeco-inline-feedback--error, [data-test-form-element-error-messages], [role=alert]');
  var out = [];
  nodes.forEach(function (n) {
    if (n.getClientRects().length === 0) return;
    var msg = (n.innerText || '').trim();
    if (!msg) return;
    var owner = null;
    var group = n.closest('[data-test-form-element], .jobs-easy-apply-form-element, .fb-dash-form-element');
    if (group) owner = group.querySelector('input, textarea, select');
    if (!owner) {
      for (var i = inputs.length - 1; i >= 0; i--) {
        if (inputs[i].compareDocumentPosition(n) & Node.DOCUMENT_POSITION_FOLLOWING) { owner = inputs[i]; break; }
      }
    }
    out.push({ field_key: owner ? ref(owner) : null, message: msg });
  });
  return out;
}"#;

/// Build `(<function>)(<json args>...)`.
pub fn invoke(function: &str, args: &[serde_json::Value]) -> String {
    let rendered: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    format!("({})({})", function, rendered.join(", "))
}

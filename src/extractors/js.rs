//! JavaScript variable extraction using SWC AST parsing
//!
//! Reads inline `<script>` blocks and converts literal values to JSON:
//! - `var/let/const x = {...}` declarations
//! - `x = {...}` and `window.x = {...}` assignments
//! - object literals passed to calls, e.g. `new Map(el, {center: {...}})`,
//!   recorded under the callee's name

use scraper::{Html, Selector};
use serde_json::Value;
use swc_common::{sync::Lrc, FileName, SourceMap};
use swc_ecma_ast::*;
use swc_ecma_parser::{lexer::Lexer, Parser, StringInput, Syntax};

/// Scripts nested deeper than this are skipped before parsing; the parser
/// recurses once per level.
const MAX_SCRIPT_NESTING: usize = 64;

/// Literal values deeper than this are dropped during conversion
const MAX_LITERAL_DEPTH: usize = 32;

/// Member chains longer than this get no name
const MAX_NAME_SEGMENTS: usize = 16;

/// Extract JavaScript variables from inline script tags, in document order.
pub fn extract_js_variables(document: &Html) -> Vec<(String, Value)> {
    let mut result = Vec::new();
    let Ok(selector) = Selector::parse("script:not([type]), script[type='text/javascript']")
    else {
        return result;
    };

    for element in document.select(&selector) {
        let script_text = element.text().collect::<String>();
        if script_text.trim().is_empty() {
            continue;
        }
        if nesting_depth(&script_text) > MAX_SCRIPT_NESTING {
            tracing::debug!(len = script_text.len(), "skipping deeply nested script");
            continue;
        }
        if let Some(vars) = parse_js_and_extract_vars(&script_text) {
            result.extend(vars);
        }
    }

    result
}

/// Deepest bracket nesting in `source`, ignoring brackets inside string and
/// regex literals and comments. Template literals are scanned as code so
/// their `${...}` parts are counted.
fn nesting_depth(source: &str) -> usize {
    let mut depth = 0usize;
    let mut max = 0usize;
    // Last significant character, to tell a regex literal from division
    let mut prev = ';';
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '(' | '[' | '{' => {
                depth += 1;
                max = max.max(depth);
            }
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            '"' | '\'' => skip_literal(&mut chars, c),
            '/' if chars.peek() == Some(&'/') => {
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        break;
                    }
                }
                continue;
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut star = false;
                for inner in chars.by_ref() {
                    if star && inner == '/' {
                        break;
                    }
                    star = inner == '*';
                }
                continue;
            }
            '/' if "(,=:[!&|?{};+-*%<>~^".contains(prev) => skip_literal(&mut chars, '/'),
            _ => {}
        }
        if !c.is_whitespace() {
            prev = c;
        }
    }
    max
}

/// Advance past a string or regex literal opened by `quote`. Literals end at
/// a line break, as unterminated ones do for the parser.
fn skip_literal(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, quote: char) {
    let mut in_class = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '\n' => break,
            '[' if quote == '/' => in_class = true,
            ']' if quote == '/' => in_class = false,
            _ if c == quote && !in_class => break,
            _ => {}
        }
    }
}

/// Parse JavaScript source and extract top-level literal values
fn parse_js_and_extract_vars(source: &str) -> Option<Vec<(String, Value)>> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(FileName::Anon.into(), source.to_string());

    let lexer = Lexer::new(
        Syntax::Es(Default::default()),
        Default::default(),
        StringInput::from(&*fm),
        None,
    );

    let mut parser = Parser::new_from(lexer);

    // JS embedded in saved pages is often broken; skip the block
    let script = match parser.parse_script() {
        Ok(s) => s,
        Err(_) => return None,
    };

    let mut result = Vec::new();
    for stmt in &script.body {
        extract_vars_from_stmt(stmt, &mut result);
    }

    Some(result)
}

fn extract_vars_from_stmt(stmt: &Stmt, result: &mut Vec<(String, Value)>) {
    match stmt {
        Stmt::Decl(Decl::Var(var_decl)) => {
            for decl in &var_decl.decls {
                let Some(init) = &decl.init else { continue };
                if let Pat::Ident(ident) = &decl.name {
                    let var_name = ident.sym.as_str().to_string();
                    match expr_to_json(init, 0) {
                        Some(value) => result.push((var_name, value)),
                        None => collect_call_args(init, result),
                    }
                }
            }
        }
        Stmt::Expr(expr_stmt) => match &*expr_stmt.expr {
            Expr::Assign(assign) => {
                let name = match &assign.left {
                    AssignTarget::Simple(SimpleAssignTarget::Ident(ident)) => {
                        Some(ident.sym.as_str().to_string())
                    }
                    AssignTarget::Simple(SimpleAssignTarget::Member(member)) => {
                        match &member.prop {
                            MemberProp::Ident(prop) => Some(prop.sym.as_str().to_string()),
                            _ => None,
                        }
                    }
                    _ => None,
                };
                if let Some(name) = name {
                    match expr_to_json(&assign.right, 0) {
                        Some(value) => result.push((name, value)),
                        None => collect_call_args(&assign.right, result),
                    }
                }
            }
            other => collect_call_args(other, result),
        },
        _ => {}
    }
}

/// Record object/array literal arguments of a call or `new` expression
fn collect_call_args(expr: &Expr, result: &mut Vec<(String, Value)>) {
    let (callee, args) = match expr {
        Expr::Call(call) => {
            let name = match &call.callee {
                Callee::Expr(callee) => expr_name(callee, 0),
                _ => None,
            };
            (name, call.args.as_slice())
        }
        Expr::New(new) => (
            expr_name(&new.callee, 0),
            new.args.as_deref().unwrap_or(&[]),
        ),
        _ => return,
    };

    let name = callee.unwrap_or_else(|| "<call>".to_string());
    for ExprOrSpread { expr: arg, .. } in args {
        if matches!(&**arg, Expr::Object(_) | Expr::Array(_)) {
            if let Some(value) = expr_to_json(arg, 0) {
                result.push((name.clone(), value));
            }
        }
    }
}

/// Dotted name of an identifier or member chain, e.g. `google.maps.Map`
fn expr_name(expr: &Expr, segments: usize) -> Option<String> {
    if segments > MAX_NAME_SEGMENTS {
        return None;
    }
    match expr {
        Expr::Ident(ident) => Some(ident.sym.as_str().to_string()),
        Expr::Member(member) => {
            let obj = expr_name(&member.obj, segments + 1)?;
            match &member.prop {
                MemberProp::Ident(prop) => Some(format!("{}.{}", obj, prop.sym.as_str())),
                _ => Some(obj),
            }
        }
        _ => None,
    }
}

fn number_to_json(value: f64) -> Option<Value> {
    if value.fract() == 0.0 && value >= i64::MIN as f64 && value <= i64::MAX as f64 {
        Some(Value::Number(serde_json::Number::from(value as i64)))
    } else {
        serde_json::Number::from_f64(value).map(Value::Number)
    }
}

/// Convert a JavaScript expression to a JSON Value
fn expr_to_json(expr: &Expr, depth: usize) -> Option<Value> {
    if depth > MAX_LITERAL_DEPTH {
        return None;
    }
    match expr {
        Expr::Lit(Lit::Str(s)) => Some(Value::String(s.value.as_str().unwrap_or("").to_string())),
        Expr::Lit(Lit::Num(n)) => number_to_json(n.value),
        Expr::Lit(Lit::Bool(b)) => Some(Value::Bool(b.value)),
        Expr::Lit(Lit::Null(_)) => Some(Value::Null),

        // Object literals: { key: value, ... }; unsupported values are dropped
        Expr::Object(obj) => {
            let mut map = serde_json::Map::new();
            for prop in &obj.props {
                if let PropOrSpread::Prop(prop) = prop {
                    if let Prop::KeyValue(kv) = &**prop {
                        let Some(key) = prop_name_to_string(&kv.key) else { continue };
                        if let Some(value) = expr_to_json(&kv.value, depth + 1) {
                            map.insert(key, value);
                        }
                    }
                }
            }
            Some(Value::Object(map))
        }

        Expr::Array(arr) => {
            let values = arr
                .elems
                .iter()
                .map(|elem| match elem {
                    Some(ExprOrSpread { expr, .. }) => {
                        expr_to_json(expr, depth + 1).unwrap_or(Value::Null)
                    }
                    None => Value::Null,
                })
                .collect();
            Some(Value::Array(values))
        }

        // JSON.parse('...') call
        Expr::Call(call) if is_json_parse_call(call) => {
            let ExprOrSpread { expr: arg, .. } = call.args.first()?;
            if let Expr::Lit(Lit::Str(s)) = &**arg {
                return serde_json::from_str(s.value.as_str()?).ok();
            }
            None
        }

        Expr::Unary(unary) if unary.op == UnaryOp::Minus => match &*unary.arg {
            Expr::Lit(Lit::Num(n)) => number_to_json(-n.value),
            _ => None,
        },

        Expr::Paren(paren) => expr_to_json(&paren.expr, depth + 1),

        // Template literals without expressions: `string`
        Expr::Tpl(tpl) if tpl.exprs.is_empty() => tpl
            .quasis
            .first()
            .map(|quasi| Value::String(quasi.raw.as_str().to_string())),

        _ => None,
    }
}

/// Check if a call expression is JSON.parse(...)
fn is_json_parse_call(call: &CallExpr) -> bool {
    if let Callee::Expr(expr) = &call.callee {
        if let Expr::Member(member) = &**expr {
            if let Expr::Ident(obj) = &*member.obj {
                if obj.sym.as_ref() == "JSON" {
                    if let MemberProp::Ident(prop) = &member.prop {
                        return prop.sym.as_ref() == "parse";
                    }
                }
            }
        }
    }
    false
}

fn prop_name_to_string(name: &PropName) -> Option<String> {
    match name {
        PropName::Ident(ident) => Some(ident.sym.as_str().to_string()),
        PropName::Str(s) => s.value.as_str().map(|v| v.to_string()),
        PropName::Num(n) => Some(n.value.to_string()),
        _ => None,
    }
}

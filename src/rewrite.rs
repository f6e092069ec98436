//! Span-splice rewriting over parsed code fragments.
//!
//! Every rewrite here follows the same discipline: parse the fragment with
//! oxc, walk the tree collecting `(start, end, replacement)` tuples for the
//! references of interest, sort descending, splice into the original text.
//! The fragment text outside the collected spans is never touched, so
//! right-hand sides and surrounding statement structure survive verbatim.
//!
//! A fragment that fails to parse is returned unchanged. That is the
//! compiler's standing policy for unsupported input forms: best-effort
//! output, no diagnostic.

use lazy_static::lazy_static;
use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Argument, AssignmentExpression, AssignmentOperator, AssignmentTarget, Expression,
    ObjectPropertyKind, PropertyKey, SimpleAssignmentTarget, Statement, StaticMemberExpression,
};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType};
use regex::Regex;
use std::collections::HashSet;

use crate::component::setter_name;

// ═══════════════════════════════════════════════════════════════════════════════
// IDENTIFIER SCANNING
// ═══════════════════════════════════════════════════════════════════════════════

lazy_static! {
    static ref IDENT_RE: Regex = Regex::new(r"\b([a-zA-Z_$][a-zA-Z0-9_$]*)\b").unwrap();
    static ref RECEIVER_RE: Regex =
        Regex::new(r"\b(?:state|props|this)\s*\.\s*([a-zA-Z_$][a-zA-Z0-9_$]*)").unwrap();
}

/// Cheap token-level scan. Used for contains-reference checks before paying
/// for a parse.
pub fn extract_identifiers(code: &str) -> HashSet<String> {
    IDENT_RE
        .captures_iter(code)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Property names reached through a receiver (`state.x`, `props.x`, `this.x`).
pub fn receiver_properties(code: &str) -> HashSet<String> {
    RECEIVER_RE
        .captures_iter(code)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// REWRITE RULES
// ═══════════════════════════════════════════════════════════════════════════════

/// How state and prop references should read after a rewrite. A `None`
/// prefix means the bare field identifier; `Some(receiver)` means
/// `receiver.field`. Getter references always become invocations, styled
/// with their own prefix: getters compile to standalone functions on most
/// targets but to member methods on `this`-receiver targets.
#[derive(Debug, Clone)]
pub struct RewriteRules {
    pub state_keys: HashSet<String>,
    pub prop_names: HashSet<String>,
    pub getter_keys: HashSet<String>,
    pub state_prefix: Option<String>,
    pub props_prefix: Option<String>,
    pub getter_prefix: Option<String>,
}

impl RewriteRules {
    fn state_ref(&self, key: &str) -> String {
        match &self.state_prefix {
            Some(receiver) => format!("{}.{}", receiver, key),
            None => key.to_string(),
        }
    }

    fn prop_ref(&self, name: &str) -> String {
        match &self.props_prefix {
            Some(receiver) => format!("{}.{}", receiver, name),
            None => name.to_string(),
        }
    }

    fn is_getter(&self, key: &str) -> bool {
        self.getter_keys.contains(key)
    }

    /// The accessor function a getter reference resolves to, without the
    /// invocation parentheses.
    fn getter_ref(&self, key: &str) -> String {
        match &self.getter_prefix {
            Some(receiver) => format!("{}.{}", receiver, key),
            None => key.to_string(),
        }
    }

    /// Styled read reference for a state key, invocation included for
    /// getters.
    fn state_read(&self, key: &str) -> String {
        if self.is_getter(key) {
            format!("{}()", self.getter_ref(key))
        } else {
            self.state_ref(key)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PUBLIC ENTRY POINTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Restyle state/prop references in a single-expression fragment.
pub fn restyle_expression(code: &str, rules: &RewriteRules) -> String {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, code, fragment_source_type()).parse_expression();
    let expr = match ret {
        Ok(expr) => expr,
        Err(_) => return code.to_string(),
    };

    let ctx = Ctx {
        source: code,
        mode: Mode::Restyle(rules),
    };
    let mut replacements = Vec::new();
    ctx.walk_expr(&expr, &mut replacements);
    apply_replacements(code, replacements)
}

/// Restyle state/prop references in a statement-sequence fragment (hook
/// bodies, handler bodies, accessor bodies).
pub fn restyle_statements(code: &str, rules: &RewriteRules) -> String {
    rewrite_fragment_statements(code, Mode::Restyle(rules))
}

/// Rewrite plain `=` assignments targeting a state field (bare or
/// receiver-qualified) into setter calls: `count = count + 1` becomes
/// `setCount(count + 1)`, the right-hand side spliced in verbatim. Compound
/// assignments and update expressions are left alone.
pub fn rewrite_assignments_to_setters(code: &str, state_keys: &HashSet<String>) -> String {
    rewrite_fragment_statements(code, Mode::Setters(state_keys))
}

fn rewrite_fragment_statements(code: &str, mode: Mode<'_>) -> String {
    // Statement fragments may contain top-level `return`; wrap in a function
    // so the parse is always well-formed, then slice the body back out.
    let wrapped = format!("function __fragment__() {{\n{}\n}}", code);

    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, &wrapped, fragment_source_type()).parse();
    if !ret.errors.is_empty() {
        return code.to_string();
    }

    let ctx = Ctx {
        source: &wrapped,
        mode,
    };
    let mut replacements = Vec::new();
    for stmt in &ret.program.body {
        ctx.walk_stmt(stmt, &mut replacements);
    }
    let rewritten = apply_replacements(&wrapped, replacements);

    let prefix = "function __fragment__() {\n";
    let suffix = "\n}";
    rewritten[prefix.len()..rewritten.len() - suffix.len()].to_string()
}

fn fragment_source_type() -> SourceType {
    SourceType::default()
        .with_module(true)
        .with_typescript(true)
        .with_jsx(true)
}

fn apply_replacements(source: &str, mut replacements: Vec<(u32, u32, String)>) -> String {
    replacements.sort_by(|a, b| b.0.cmp(&a.0));
    let mut result = source.to_string();
    for (start, end, text) in replacements {
        result.replace_range(start as usize..end as usize, &text);
    }
    result
}

// ═══════════════════════════════════════════════════════════════════════════════
// TREE WALK
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy)]
enum Mode<'r> {
    Restyle(&'r RewriteRules),
    Setters(&'r HashSet<String>),
}

struct Ctx<'s, 'r> {
    source: &'s str,
    mode: Mode<'r>,
}

type Replacements = Vec<(u32, u32, String)>;

impl<'s, 'r> Ctx<'s, 'r> {
    fn push(&self, out: &mut Replacements, start: u32, end: u32, text: String) {
        // Identity splices happen when the styled form already matches the
        // source (bare style over an already-bare reference); skip them.
        if &self.source[start as usize..end as usize] != text {
            out.push((start, end, text));
        }
    }

    fn rules(&self) -> Option<&'r RewriteRules> {
        match self.mode {
            Mode::Restyle(rules) => Some(rules),
            Mode::Setters(_) => None,
        }
    }

    fn walk_stmt(&self, stmt: &Statement<'_>, out: &mut Replacements) {
        match stmt {
            Statement::VariableDeclaration(var) => {
                // Declaration bindings stay: only references are restyled.
                for decl in &var.declarations {
                    if let Some(init) = &decl.init {
                        self.walk_expr(init, out);
                    }
                }
            }
            Statement::FunctionDeclaration(func) => {
                if let Some(body) = &func.body {
                    for s in &body.statements {
                        self.walk_stmt(s, out);
                    }
                }
            }
            Statement::ExpressionStatement(expr_stmt) => {
                self.walk_expr(&expr_stmt.expression, out);
            }
            Statement::BlockStatement(block) => {
                for s in &block.body {
                    self.walk_stmt(s, out);
                }
            }
            Statement::IfStatement(if_stmt) => {
                self.walk_expr(&if_stmt.test, out);
                self.walk_stmt(&if_stmt.consequent, out);
                if let Some(alt) = &if_stmt.alternate {
                    self.walk_stmt(alt, out);
                }
            }
            Statement::ReturnStatement(ret) => {
                if let Some(arg) = &ret.argument {
                    self.walk_expr(arg, out);
                }
            }
            Statement::WhileStatement(w) => {
                self.walk_expr(&w.test, out);
                self.walk_stmt(&w.body, out);
            }
            Statement::DoWhileStatement(d) => {
                self.walk_stmt(&d.body, out);
                self.walk_expr(&d.test, out);
            }
            Statement::ForStatement(f) => {
                if let Some(init) = &f.init {
                    if let Some(e) = init.as_expression() {
                        self.walk_expr(e, out);
                    }
                }
                if let Some(test) = &f.test {
                    self.walk_expr(test, out);
                }
                if let Some(update) = &f.update {
                    self.walk_expr(update, out);
                }
                self.walk_stmt(&f.body, out);
            }
            Statement::ForOfStatement(f) => {
                self.walk_expr(&f.right, out);
                self.walk_stmt(&f.body, out);
            }
            Statement::ForInStatement(f) => {
                self.walk_expr(&f.right, out);
                self.walk_stmt(&f.body, out);
            }
            Statement::SwitchStatement(sw) => {
                self.walk_expr(&sw.discriminant, out);
                for case in &sw.cases {
                    if let Some(test) = &case.test {
                        self.walk_expr(test, out);
                    }
                    for s in &case.consequent {
                        self.walk_stmt(s, out);
                    }
                }
            }
            _ => {}
        }
    }

    fn walk_expr(&self, expr: &Expression<'_>, out: &mut Replacements) {
        match expr {
            Expression::Identifier(id) => {
                if let Some(rules) = self.rules() {
                    let name = id.name.as_str();
                    if rules.state_keys.contains(name) {
                        self.push(out, id.span.start, id.span.end, rules.state_read(name));
                    } else if rules.prop_names.contains(name) {
                        self.push(out, id.span.start, id.span.end, rules.prop_ref(name));
                    }
                }
            }
            Expression::StaticMemberExpression(member) => {
                self.rewrite_member_read(member, out);
            }
            Expression::ComputedMemberExpression(member) => {
                self.walk_expr(&member.object, out);
                self.walk_expr(&member.expression, out);
            }
            Expression::CallExpression(call) => {
                // A getter reference already in call position keeps its
                // existing parentheses; restyle the callee without adding
                // another invocation.
                if !self.restyle_getter_callee(&call.callee, out) {
                    self.walk_expr(&call.callee, out);
                }
                for arg in &call.arguments {
                    self.walk_argument(arg, out);
                }
            }
            Expression::NewExpression(new_expr) => {
                self.walk_expr(&new_expr.callee, out);
                for arg in &new_expr.arguments {
                    self.walk_argument(arg, out);
                }
            }
            Expression::AssignmentExpression(assign) => {
                self.rewrite_assignment(assign, out);
            }
            Expression::UpdateExpression(update) => match &update.argument {
                SimpleAssignmentTarget::AssignmentTargetIdentifier(id) => {
                    if let Some(rules) = self.rules() {
                        let name = id.name.as_str();
                        if rules.state_keys.contains(name) && !rules.is_getter(name) {
                            self.push(out, id.span.start, id.span.end, rules.state_ref(name));
                        }
                    }
                }
                SimpleAssignmentTarget::StaticMemberExpression(member) => {
                    self.rewrite_member_write(member, out);
                }
                SimpleAssignmentTarget::ComputedMemberExpression(member) => {
                    self.walk_expr(&member.object, out);
                    self.walk_expr(&member.expression, out);
                }
                _ => {}
            },
            Expression::BinaryExpression(bin) => {
                self.walk_expr(&bin.left, out);
                self.walk_expr(&bin.right, out);
            }
            Expression::LogicalExpression(logical) => {
                self.walk_expr(&logical.left, out);
                self.walk_expr(&logical.right, out);
            }
            Expression::UnaryExpression(unary) => {
                self.walk_expr(&unary.argument, out);
            }
            Expression::ConditionalExpression(cond) => {
                self.walk_expr(&cond.test, out);
                self.walk_expr(&cond.consequent, out);
                self.walk_expr(&cond.alternate, out);
            }
            Expression::ParenthesizedExpression(paren) => {
                self.walk_expr(&paren.expression, out);
            }
            Expression::SequenceExpression(seq) => {
                for e in &seq.expressions {
                    self.walk_expr(e, out);
                }
            }
            Expression::TemplateLiteral(tpl) => {
                for e in &tpl.expressions {
                    self.walk_expr(e, out);
                }
            }
            Expression::AwaitExpression(await_expr) => {
                self.walk_expr(&await_expr.argument, out);
            }
            Expression::ObjectExpression(obj) => {
                for prop in &obj.properties {
                    match prop {
                        ObjectPropertyKind::ObjectProperty(p) => {
                            if p.shorthand {
                                self.rewrite_shorthand(p, out);
                            } else {
                                if p.computed {
                                    if let Some(key_expr) = p.key.as_expression() {
                                        self.walk_expr(key_expr, out);
                                    }
                                }
                                self.walk_expr(&p.value, out);
                            }
                        }
                        ObjectPropertyKind::SpreadProperty(spread) => {
                            self.walk_expr(&spread.argument, out);
                        }
                    }
                }
            }
            Expression::ArrayExpression(arr) => {
                for elem in &arr.elements {
                    if let Some(e) = elem.as_expression() {
                        self.walk_expr(e, out);
                    }
                }
            }
            Expression::ArrowFunctionExpression(func) => {
                for s in &func.body.statements {
                    self.walk_stmt(s, out);
                }
            }
            Expression::FunctionExpression(func) => {
                if let Some(body) = &func.body {
                    for s in &body.statements {
                        self.walk_stmt(s, out);
                    }
                }
            }
            _ => {}
        }
    }

    fn walk_argument(&self, arg: &Argument<'_>, out: &mut Replacements) {
        if let Some(e) = arg.as_expression() {
            self.walk_expr(e, out);
        } else if let Argument::SpreadElement(spread) = arg {
            self.walk_expr(&spread.argument, out);
        }
    }

    /// `{ count }` must keep its key while the value reference is restyled.
    fn rewrite_shorthand(&self, p: &oxc_ast::ast::ObjectProperty<'_>, out: &mut Replacements) {
        let rules = match self.rules() {
            Some(rules) => rules,
            None => return,
        };
        if let PropertyKey::StaticIdentifier(id) = &p.key {
            let name = id.name.as_str();
            let styled = if rules.state_keys.contains(name) {
                Some(rules.state_read(name))
            } else if rules.prop_names.contains(name) {
                Some(rules.prop_ref(name))
            } else {
                None
            };
            if let Some(text) = styled {
                self.push(out, p.span.start, p.span.end, format!("{}: {}", name, text));
            }
        }
    }

    /// `state.x` / `this.x` / `props.x` in read position.
    fn rewrite_member_read(&self, member: &StaticMemberExpression<'_>, out: &mut Replacements) {
        if let Some(rules) = self.rules() {
            let property = member.property.name.as_str();
            if is_state_receiver(&member.object) && rules.state_keys.contains(property) {
                self.push(
                    out,
                    member.span.start,
                    member.span.end,
                    rules.state_read(property),
                );
                return;
            }
            if is_props_receiver(&member.object) && rules.prop_names.contains(property) {
                self.push(
                    out,
                    member.span.start,
                    member.span.end,
                    rules.prop_ref(property),
                );
                return;
            }
        }
        self.walk_expr(&member.object, out);
    }

    /// `state.x` / `this.x` in write position (assignment target, update).
    fn rewrite_member_write(&self, member: &StaticMemberExpression<'_>, out: &mut Replacements) {
        if let Some(rules) = self.rules() {
            let property = member.property.name.as_str();
            if is_state_receiver(&member.object)
                && rules.state_keys.contains(property)
                && !rules.is_getter(property)
            {
                self.push(
                    out,
                    member.span.start,
                    member.span.end,
                    rules.state_ref(property),
                );
                return;
            }
        }
        self.walk_expr(&member.object, out);
    }

    fn restyle_getter_callee(&self, callee: &Expression<'_>, out: &mut Replacements) -> bool {
        let rules = match self.rules() {
            Some(rules) => rules,
            None => return false,
        };
        match callee {
            Expression::Identifier(id) if rules.is_getter(id.name.as_str()) => {
                let text = rules.getter_ref(id.name.as_str());
                self.push(out, id.span.start, id.span.end, text);
                true
            }
            Expression::StaticMemberExpression(member)
                if is_state_receiver(&member.object)
                    && rules.is_getter(member.property.name.as_str()) =>
            {
                let text = rules.getter_ref(member.property.name.as_str());
                self.push(out, member.span.start, member.span.end, text);
                true
            }
            _ => false,
        }
    }

    fn rewrite_assignment(&self, assign: &AssignmentExpression<'_>, out: &mut Replacements) {
        if let Mode::Setters(state_keys) = &self.mode {
            if assign.operator == AssignmentOperator::Assign {
                let field = match &assign.left {
                    AssignmentTarget::AssignmentTargetIdentifier(id)
                        if state_keys.contains(id.name.as_str()) =>
                    {
                        Some(id.name.to_string())
                    }
                    AssignmentTarget::StaticMemberExpression(member)
                        if is_state_receiver(&member.object)
                            && state_keys.contains(member.property.name.as_str()) =>
                    {
                        Some(member.property.name.to_string())
                    }
                    _ => None,
                };
                if let Some(field) = field {
                    let rhs_span = assign.right.span();
                    let rhs = &self.source[rhs_span.start as usize..rhs_span.end as usize];
                    let replacement = format!("{}({})", setter_name(&field), rhs);
                    out.push((assign.span.start, assign.span.end, replacement));
                    // The right-hand side is spliced verbatim; walking into
                    // it would produce overlapping spans.
                    return;
                }
            }
        }

        match &assign.left {
            AssignmentTarget::AssignmentTargetIdentifier(id) => {
                if let Some(rules) = self.rules() {
                    let name = id.name.as_str();
                    if rules.state_keys.contains(name) && !rules.is_getter(name) {
                        self.push(out, id.span.start, id.span.end, rules.state_ref(name));
                    }
                }
            }
            AssignmentTarget::StaticMemberExpression(member) => {
                self.rewrite_member_write(member, out);
            }
            AssignmentTarget::ComputedMemberExpression(member) => {
                self.walk_expr(&member.object, out);
                self.walk_expr(&member.expression, out);
            }
            _ => {}
        }
        self.walk_expr(&assign.right, out);
    }
}

fn is_state_receiver(object: &Expression<'_>) -> bool {
    match object {
        Expression::ThisExpression(_) => true,
        Expression::Identifier(id) => id.name == "state",
        _ => false,
    }
}

fn is_props_receiver(object: &Expression<'_>) -> bool {
    match object {
        Expression::ThisExpression(_) => true,
        Expression::Identifier(id) => id.name == "props",
        _ => false,
    }
}

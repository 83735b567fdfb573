//! Lowering of the ES2015 syntax oxc's transformer leaves in place.
//!
//! oxc lowers arrow functions and everything newer than ES2015, but has no
//! passes for the rest of ES2015. This module rewrites what remains:
//!
//! - `let`/`const` become `var`
//! - template literals become concatenation, tagged ones a plain call
//! - shorthand properties, methods and computed keys in object literals
//! - parameter defaults, rest parameters and destructuring
//! - classes become constructor functions with prototype assignments
//! - `for...of` and spread work on arrays and array-likes
//!
//! Generators have no ES5 form and are reported as errors.
//!
//! Rewrites are recorded as edits over the input text, innermost first, and
//! rendered in one pass that also produces the source map back to the input.

use std::cmp::Reverse;
use std::fmt::Write;

use oxc::allocator::Allocator;
use oxc::ast::ast::*;
use oxc::ast_visit::{Visit, walk};
use oxc::parser::Parser;
use oxc::span::{GetSpan, SourceType, Span};
use oxc::syntax::scope::ScopeFlags;
use parcel_sourcemap::{OriginalLocation, SourceMap};
use rustc_hash::FxHashSet;

use super::scripts::render_diagnostics;

/// Lower `source` to ES5. Returns the code and its map back to `source`.
pub fn lower(source: &str, filename: &str) -> Result<(String, String), String> {
    let end = u32::try_from(source.len()).map_err(|_| format!("{filename} is too large"))?;
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
    if !ret.errors.is_empty() {
        return Err(render_diagnostics(ret.errors, source));
    }

    let mut lowering = Lowering::new(source);
    lowering.visit_program(&ret.program);
    if !lowering.errors.is_empty() {
        return Err(lowering.errors.join("\n"));
    }
    let code = lowering.render(0, end);
    emit(source, &code, filename)
}

/// Output text: unchanged input ranges and new text.
#[derive(Debug, Clone, Default)]
struct Code(Vec<Piece>);

#[derive(Debug, Clone)]
enum Piece {
    /// Input between two offsets, copied as is.
    Source(u32, u32),
    /// New text, attributed to an input offset.
    Text(String, u32),
}

impl Code {
    fn text(text: impl Into<String>, origin: u32) -> Self {
        let mut code = Self::default();
        code.push(text, origin);
        code
    }

    fn push(&mut self, text: impl Into<String>, origin: u32) {
        let text = text.into();
        if !text.is_empty() {
            self.0.push(Piece::Text(text, origin));
        }
    }

    fn source(&mut self, start: u32, end: u32) {
        if start < end {
            self.0.push(Piece::Source(start, end));
        }
    }

    fn append(&mut self, other: Code) {
        self.0.extend(other.0);
    }

    fn join(parts: Vec<Code>, separator: &str, origin: u32) -> Code {
        let mut code = Code::default();
        for (index, part) in parts.into_iter().enumerate() {
            if index > 0 {
                code.push(separator, origin);
            }
            code.append(part);
        }
        code
    }

    fn to_text(&self, source: &str) -> String {
        self.0
            .iter()
            .map(|piece| match piece {
                Piece::Source(start, end) => &source[*start as usize..*end as usize],
                Piece::Text(text, _) => text.as_str(),
            })
            .collect()
    }

    /// Whether the code is a single identifier and can be repeated.
    fn is_identifier(&self, source: &str) -> bool {
        let text = self.to_text(source);
        let mut chars = text.chars();
        chars
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
            && chars.all(is_word)
    }
}

/// Replacement of `start..end`. Zero-width edits insert.
#[derive(Debug)]
struct Edit {
    start: u32,
    end: u32,
    seq: usize,
    code: Code,
}

/// A function body (or the program) that may receive declarations.
#[derive(Debug)]
struct Frame {
    /// Offset just after the opening brace and any directives.
    at: u32,
    temps: Vec<String>,
    prologue: Code,
}

impl Frame {
    fn new(at: u32) -> Self {
        Self {
            at,
            temps: Vec::new(),
            prologue: Code::default(),
        }
    }
}

#[derive(Debug)]
struct ClassScope {
    /// Variable holding the parent class, for classes with `extends`.
    parent: Option<String>,
    static_member: bool,
}

enum Item {
    Plain(Span),
    Spread(Span),
    Hole,
}

struct Lowering<'s> {
    source: &'s str,
    lines: Lines,
    edits: Vec<Edit>,
    frames: Vec<Frame>,
    classes: Vec<ClassScope>,
    names: FxHashSet<String>,
    errors: Vec<String>,
}

impl<'s> Lowering<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            lines: Lines::new(source),
            edits: Vec::new(),
            frames: Vec::new(),
            classes: Vec::new(),
            names: FxHashSet::default(),
            errors: Vec::new(),
        }
    }

    /// Input `start..end` with every edit inside it applied.
    ///
    /// An edit shadows the older edits it contains: it was built from their
    /// output already.
    fn render(&self, start: u32, end: u32) -> Code {
        let mut inner: Vec<&Edit> = self
            .edits
            .iter()
            .filter(|edit| edit.start >= start && edit.end <= end)
            .collect();
        inner.sort_by_key(|edit| (edit.start, edit.start != edit.end, Reverse(edit.end), Reverse(edit.seq)));

        let mut code = Code::default();
        let mut cursor = start;
        for (index, edit) in inner.iter().enumerate() {
            if edit.start < cursor {
                continue;
            }
            let inserted_later = edit.start == edit.end
                && inner[index + 1..]
                    .iter()
                    .take_while(|other| other.start == edit.start)
                    .any(|other| other.end > other.start && other.seq > edit.seq);
            if inserted_later {
                continue;
            }
            code.source(cursor, edit.start);
            code.append(edit.code.clone());
            cursor = edit.end;
        }
        code.source(cursor, end);
        code
    }

    fn render_span(&self, span: Span) -> Code {
        self.render(span.start, span.end)
    }

    fn edit(&mut self, start: u32, end: u32, code: Code) {
        let seq = self.edits.len();
        self.edits.push(Edit {
            start,
            end,
            seq,
            code,
        });
    }

    fn replace(&mut self, span: Span, code: Code) {
        self.edit(span.start, span.end, code);
    }

    /// A name that appears nowhere in the input and was not handed out yet.
    fn fresh(&mut self, base: &str) -> String {
        let mut n = 1;
        loop {
            let name = if n == 1 {
                format!("_{base}")
            } else {
                format!("_{base}{n}")
            };
            if !self.source.contains(name.as_str()) && self.names.insert(name.clone()) {
                return name;
            }
            n += 1;
        }
    }

    /// A fresh variable declared at the top of the enclosing function.
    fn temp(&mut self, base: &str) -> String {
        let name = self.fresh(base);
        if let Some(frame) = self.frames.last_mut() {
            frame.temps.push(name.clone());
        }
        name
    }

    fn unsupported(&mut self, span: Span, what: &str) {
        let (line, column) = self.lines.locate(self.source, span.start);
        self.errors.push(format!(
            "{}:{}: {what} cannot be lowered to ES5",
            line + 1,
            column + 1
        ));
    }

    fn close_frame(&mut self) {
        let Some(frame) = self.frames.pop() else {
            return;
        };
        let mut code = Code::default();
        if !frame.temps.is_empty() {
            code.push(format!("\nvar {};", frame.temps.join(", ")), frame.at);
        }
        code.append(frame.prologue);
        if !code.0.is_empty() {
            self.edit(frame.at, frame.at, code);
        }
    }

    /// `(params) { body }` of `func`.
    fn function_tail(&self, func: &Function<'_>) -> Code {
        let end = func
            .body
            .as_ref()
            .map_or(func.params.span.end, |body| body.span.end);
        self.render(func.params.span.start, end)
    }

    /// Property access for `key`: `.name` or `[key]`.
    fn member_key(&mut self, key: &PropertyKey<'_>, computed: bool) -> Code {
        match key {
            PropertyKey::StaticIdentifier(id) if !computed => {
                Code::text(format!(".{}", id.name), id.span.start)
            }
            PropertyKey::PrivateIdentifier(id) => {
                self.unsupported(id.span, "private member");
                Code::text(format!(".{}", id.name), id.span.start)
            }
            key => {
                let span = key.span();
                let mut code = Code::text("[", span.start);
                code.append(self.render_span(span));
                code.push("]", span.end);
                code
            }
        }
    }

    /// `key` as a property name expression: `"name"` or the key itself.
    fn key_name(&mut self, key: &PropertyKey<'_>, computed: bool) -> Code {
        match key {
            PropertyKey::StaticIdentifier(id) if !computed => {
                Code::text(js_string(id.name.as_str()), id.span.start)
            }
            PropertyKey::PrivateIdentifier(id) => {
                self.unsupported(id.span, "private member");
                Code::text(js_string(id.name.as_str()), id.span.start)
            }
            key => self.render_span(key.span()),
        }
    }

    /// `value` in a form that can be repeated: itself when it is an
    /// identifier, otherwise a variable assigned once.
    ///
    /// With `declare` the variable is one of the bindings in `out`;
    /// otherwise it is declared in the enclosing function.
    fn reusable(&mut self, value: Code, origin: u32, declare: bool, out: &mut Vec<Code>) -> Code {
        if value.is_identifier(self.source) {
            return value;
        }
        let name = if declare {
            self.fresh("ref")
        } else {
            self.temp("ref")
        };
        let mut code = Code::text(format!("{name} = "), origin);
        code.append(value);
        out.push(code);
        Code::text(name, origin)
    }

    /// `value`, or `default` when it is undefined.
    fn defaulted(
        &mut self,
        value: Code,
        default: &Expression<'_>,
        origin: u32,
        declare: bool,
        out: &mut Vec<Code>,
    ) -> Code {
        let value = self.reusable(value, origin, declare, out);
        let mut code = Code::text("(", origin);
        code.append(value.clone());
        code.push(" === void 0 ? ", origin);
        code.append(self.render_span(default.span()));
        code.push(" : ", origin);
        code.append(value);
        code.push(")", origin);
        code
    }

    /// `name = value` bindings that destructure `value` into `pattern`.
    fn bind(&mut self, pattern: &BindingPattern<'_>, value: Code, declare: bool, out: &mut Vec<Code>) {
        match pattern {
            BindingPattern::BindingIdentifier(id) => {
                let mut code = Code::text(format!("{} = ", id.name), id.span.start);
                code.append(value);
                out.push(code);
            }
            BindingPattern::AssignmentPattern(pattern) => {
                let value = self.defaulted(value, &pattern.right, pattern.span.start, declare, out);
                self.bind(&pattern.left, value, declare, out);
            }
            BindingPattern::ObjectPattern(pattern) => {
                let value = self.reusable(value, pattern.span.start, declare, out);
                for property in &pattern.properties {
                    let mut member = value.clone();
                    member.append(self.member_key(&property.key, property.computed));
                    self.bind(&property.value, member, declare, out);
                }
                if let Some(rest) = &pattern.rest {
                    self.unsupported(rest.span, "object rest");
                }
            }
            BindingPattern::ArrayPattern(pattern) => {
                let value = self.reusable(value, pattern.span.start, declare, out);
                for (index, element) in pattern.elements.iter().enumerate() {
                    let Some(element) = element else {
                        continue;
                    };
                    let mut item = value.clone();
                    item.push(format!("[{index}]"), element.span().start);
                    self.bind(element, item, declare, out);
                }
                if let Some(rest) = &pattern.rest {
                    let mut tail = value;
                    tail.push(format!(".slice({})", pattern.elements.len()), rest.span.start);
                    self.bind(&rest.argument, tail, declare, out);
                }
            }
        }
    }

    /// `target = value` assignments that destructure `value` into `target`.
    fn assign(&mut self, target: &AssignmentTarget<'_>, value: Code, out: &mut Vec<Code>) {
        match target {
            AssignmentTarget::ObjectAssignmentTarget(pattern) => {
                let value = self.reusable(value, pattern.span.start, false, out);
                for property in &pattern.properties {
                    match property {
                        AssignmentTargetProperty::AssignmentTargetPropertyIdentifier(property) => {
                            let name = &property.binding.name;
                            let origin = property.span.start;
                            let mut member = value.clone();
                            member.push(format!(".{name}"), origin);
                            let member = match &property.init {
                                Some(init) => self.defaulted(member, init, origin, false, out),
                                None => member,
                            };
                            let mut code = Code::text(format!("{name} = "), origin);
                            code.append(member);
                            out.push(code);
                        }
                        AssignmentTargetProperty::AssignmentTargetPropertyProperty(property) => {
                            let mut member = value.clone();
                            member.append(self.member_key(&property.name, property.computed));
                            self.assign_maybe_default(&property.binding, member, out);
                        }
                    }
                }
                if let Some(rest) = &pattern.rest {
                    self.unsupported(rest.span, "object rest");
                }
            }
            AssignmentTarget::ArrayAssignmentTarget(pattern) => {
                let value = self.reusable(value, pattern.span.start, false, out);
                for (index, element) in pattern.elements.iter().enumerate() {
                    let Some(element) = element else {
                        continue;
                    };
                    let mut item = value.clone();
                    item.push(format!("[{index}]"), element.span().start);
                    self.assign_maybe_default(element, item, out);
                }
                if let Some(rest) = &pattern.rest {
                    let mut tail = value;
                    tail.push(format!(".slice({})", pattern.elements.len()), rest.span.start);
                    self.assign(&rest.target, tail, out);
                }
            }
            simple => {
                let span = simple.span();
                let mut code = self.render_span(span);
                code.push(" = ", span.end);
                code.append(value);
                out.push(code);
            }
        }
    }

    fn assign_maybe_default(
        &mut self,
        target: &AssignmentTargetMaybeDefault<'_>,
        value: Code,
        out: &mut Vec<Code>,
    ) {
        match target {
            AssignmentTargetMaybeDefault::AssignmentTargetWithDefault(target) => {
                let value = self.defaulted(value, &target.init, target.span.start, false, out);
                self.assign(&target.binding, value, out);
            }
            target => {
                if let Some(target) = target.as_assignment_target() {
                    self.assign(target, value, out);
                }
            }
        }
    }

    /// Rewrite a parameter list with defaults, patterns or a rest element
    /// into plain names, moving the rest into the body.
    fn lower_params(&mut self, params: &FormalParameters<'_>) {
        let plain = params.rest.is_none()
            && params.items.iter().all(|param| {
                param.initializer.is_none()
                    && matches!(param.pattern, BindingPattern::BindingIdentifier(_))
            });
        if plain {
            return;
        }

        let mut names = Vec::new();
        let mut prologue = Code::default();
        for param in &params.items {
            let origin = param.span.start;
            let name = match &param.pattern {
                BindingPattern::BindingIdentifier(id) => id.name.to_string(),
                _ => self.fresh("param"),
            };
            if let Some(default) = &param.initializer {
                prologue.push(format!("\nif ({name} === void 0) {name} = "), origin);
                prologue.append(self.render_span(default.span()));
                prologue.push(";", param.span.end);
            }
            if !matches!(param.pattern, BindingPattern::BindingIdentifier(_)) {
                let mut bindings = Vec::new();
                self.bind(&param.pattern, Code::text(name.clone(), origin), true, &mut bindings);
                prologue.push("\nvar ", origin);
                prologue.append(Code::join(bindings, ", ", origin));
                prologue.push(";", param.span.end);
            }
            names.push(name);
        }
        if let Some(rest) = &params.rest {
            let origin = rest.span.start;
            let slice = Code::text(
                format!("Array.prototype.slice.call(arguments, {})", params.items.len()),
                origin,
            );
            let mut bindings = Vec::new();
            self.bind(&rest.rest.argument, slice, true, &mut bindings);
            prologue.push("\nvar ", origin);
            prologue.append(Code::join(bindings, ", ", origin));
            prologue.push(";", rest.span.end);
        }

        if let Some(frame) = self.frames.last_mut() {
            frame.prologue.append(prologue);
        }
        self.replace(
            params.span,
            Code::text(format!("({})", names.join(", ")), params.span.start),
        );
    }

    /// The parent class variable for `super(...)`.
    fn parent_class(&mut self, span: Span) -> Option<String> {
        let parent = self.classes.last().and_then(|scope| scope.parent.clone());
        if parent.is_none() {
            self.unsupported(span, "`super` outside a derived class");
        }
        parent
    }

    /// `super.name` / `super[key]` against the parent class or its prototype.
    fn super_member(&mut self, span: Span, access: Code) -> Option<Code> {
        let parent = self.parent_class(span)?;
        let is_static = self.classes.last().is_some_and(|scope| scope.static_member);
        let base = if is_static {
            parent
        } else {
            format!("{parent}.prototype")
        };
        let mut code = Code::text(base, span.start);
        code.append(access);
        Some(code)
    }

    /// Array built from `items`, with spreads expanded through `concat`.
    fn spread_array(&self, items: &[Item], origin: u32) -> Code {
        let literal = |chunk: Vec<Code>| {
            let mut code = Code::text("[", origin);
            code.append(Code::join(chunk, ", ", origin));
            code.push("]", origin);
            code
        };

        let mut parts = Vec::new();
        let mut chunk = Vec::new();
        for item in items {
            match item {
                Item::Plain(span) => chunk.push(self.render_span(*span)),
                Item::Hole => chunk.push(Code::default()),
                Item::Spread(span) => {
                    if !chunk.is_empty() {
                        parts.push(literal(std::mem::take(&mut chunk)));
                    }
                    let mut code = Code::text("Array.prototype.slice.call(", span.start);
                    code.append(self.render_span(*span));
                    code.push(")", span.end);
                    parts.push(code);
                }
            }
        }
        if !chunk.is_empty() {
            parts.push(literal(chunk));
        }

        let mut parts = parts.into_iter();
        let starts_plain = matches!(items.first(), Some(Item::Plain(_) | Item::Hole));
        let head = if starts_plain { parts.next() } else { None };
        let mut code = head.unwrap_or_else(|| Code::text("[]", origin));
        code.push(".concat(", origin);
        code.append(Code::join(parts.collect(), ", ", origin));
        code.push(")", origin);
        code
    }

    /// Object for a method call and the value `this` should take, assigning
    /// the object to a variable unless it can be repeated.
    fn receiver(&mut self, object: &Expression<'_>) -> (Code, Code) {
        let span = object.span();
        let rendered = self.render_span(span);
        if matches!(object, Expression::Identifier(_) | Expression::ThisExpression(_)) {
            return (rendered.clone(), rendered);
        }
        let name = self.temp("this");
        let mut code = Code::text(format!("({name} = "), span.start);
        code.append(rendered);
        code.push(")", span.end);
        (code, Code::text(name, span.start))
    }

    fn lower_spread_call(&mut self, call: &CallExpression<'_>) {
        let origin = call.span.start;
        let array = self.spread_array(&argument_items(&call.arguments), origin);
        let (mut code, this) = match &call.callee {
            Expression::StaticMemberExpression(member) => {
                let (mut code, this) = self.receiver(&member.object);
                code.push(format!(".{}", member.property.name), member.property.span.start);
                (code, this)
            }
            Expression::ComputedMemberExpression(member) => {
                let (mut code, this) = self.receiver(&member.object);
                let span = member.expression.span();
                code.push("[", span.start);
                code.append(self.render_span(span));
                code.push("]", span.end);
                (code, this)
            }
            callee => (self.render_span(callee.span()), Code::text("void 0", origin)),
        };
        code.push(".apply(", origin);
        code.append(this);
        code.push(", ", origin);
        code.append(array);
        code.push(")", call.span.end);
        self.replace(call.span, code);
    }

    /// Assignment of one object literal property onto `target`.
    fn assign_property(&mut self, target: &str, property: &ObjectProperty<'_>) -> Code {
        let origin = property.span.start;
        let value = self.property_value(property);
        match property.kind {
            PropertyKind::Init => {
                let mut code = Code::text(target, origin);
                code.append(self.member_key(&property.key, property.computed));
                code.push(" = ", origin);
                code.append(value);
                code
            }
            PropertyKind::Get | PropertyKind::Set => {
                let accessor = if matches!(property.kind, PropertyKind::Get) {
                    "get"
                } else {
                    "set"
                };
                let mut code = Code::text(format!("Object.defineProperty({target}, "), origin);
                code.append(self.key_name(&property.key, property.computed));
                code.push(format!(", {{ {accessor}: "), origin);
                code.append(value);
                code.push(", enumerable: true, configurable: true })", property.span.end);
                code
            }
        }
    }

    /// Value of an object literal property; methods and accessors become
    /// function expressions.
    fn property_value(&self, property: &ObjectProperty<'_>) -> Code {
        match &property.value {
            Expression::FunctionExpression(func)
                if property.method || !matches!(property.kind, PropertyKind::Init) =>
            {
                let mut code = Code::text("function ", func.span.start);
                code.append(self.function_tail(func));
                code
            }
            value => self.render_span(value.span()),
        }
    }

    fn lower_class(&mut self, class: &Class<'_>, parent: Option<String>) {
        let origin = class.span.start;
        let name = match &class.id {
            Some(id) => id.name.to_string(),
            None => self.fresh("class"),
        };

        let mut body = Code::text(
            format!("(function ({}) {{\n", parent.as_deref().unwrap_or_default()),
            origin,
        );
        let constructor = class.body.body.iter().find_map(|element| match element {
            ClassElement::MethodDefinition(method)
                if matches!(method.kind, MethodDefinitionKind::Constructor) =>
            {
                Some(method)
            }
            _ => None,
        });
        match constructor {
            Some(constructor) => {
                body.push(format!("function {name}"), constructor.span.start);
                body.append(self.function_tail(&constructor.value));
            }
            None => {
                let forward = parent
                    .as_ref()
                    .map(|parent| format!(" {parent}.apply(this, arguments); "))
                    .unwrap_or_default();
                body.push(format!("function {name}() {{{forward}}}"), origin);
            }
        }
        body.push("\n", origin);
        if let Some(parent) = &parent {
            body.push(
                format!(
                    "{name}.prototype = Object.create({parent} && {parent}.prototype, \
                     {{ constructor: {{ value: {name}, writable: true, configurable: true }} }});\n\
                     if ({parent}) {{ if (Object.setPrototypeOf) Object.setPrototypeOf({name}, {parent}); \
                     else {name}.__proto__ = {parent}; }}\n"
                ),
                origin,
            );
        }

        let mut accessors: Vec<Accessor> = Vec::new();
        for element in &class.body.body {
            let ClassElement::MethodDefinition(method) = element else {
                continue;
            };
            let target = if method.r#static {
                name.clone()
            } else {
                format!("{name}.prototype")
            };
            let mut function = Code::text("function ", method.value.span.start);
            function.append(self.function_tail(&method.value));
            match method.kind {
                MethodDefinitionKind::Constructor => {}
                MethodDefinitionKind::Method => {
                    body.push(target, method.span.start);
                    body.append(self.member_key(&method.key, method.computed));
                    body.push(" = ", method.span.start);
                    body.append(function);
                    body.push(";\n", method.span.end);
                }
                MethodDefinitionKind::Get | MethodDefinitionKind::Set => {
                    let key = self.key_name(&method.key, method.computed);
                    let key_text = key.to_text(self.source);
                    let existing = accessors
                        .iter()
                        .position(|a| a.target == target && a.key_text == key_text);
                    let index = match existing {
                        Some(index) => index,
                        None => {
                            accessors.push(Accessor {
                                target,
                                key_text,
                                key,
                                getter: None,
                                setter: None,
                                origin: method.span.start,
                            });
                            accessors.len() - 1
                        }
                    };
                    let accessor = &mut accessors[index];
                    if matches!(method.kind, MethodDefinitionKind::Get) {
                        accessor.getter = Some(function);
                    } else {
                        accessor.setter = Some(function);
                    }
                }
            }
        }
        for accessor in accessors {
            let origin = accessor.origin;
            body.push(format!("Object.defineProperty({}, ", accessor.target), origin);
            body.append(accessor.key);
            body.push(", {", origin);
            if let Some(getter) = accessor.getter {
                body.push(" get: ", origin);
                body.append(getter);
                body.push(",", origin);
            }
            if let Some(setter) = accessor.setter {
                body.push(" set: ", origin);
                body.append(setter);
                body.push(",", origin);
            }
            body.push(" enumerable: false, configurable: true });\n", origin);
        }

        body.push(format!("return {name};\n}})("), class.body.span.end);
        if let Some(super_class) = &class.super_class {
            body.append(self.render_span(super_class.span()));
        }
        body.push(")", class.span.end);

        let code = if matches!(class.r#type, ClassType::ClassDeclaration) && class.id.is_some() {
            let mut code = Code::text(format!("var {name} = "), origin);
            code.append(body);
            code.push(";", class.span.end);
            code
        } else {
            body
        };
        self.replace(class.span, code);
    }
}

/// Getter and setter sharing one property.
struct Accessor {
    target: String,
    key_text: String,
    key: Code,
    getter: Option<Code>,
    setter: Option<Code>,
    origin: u32,
}

fn argument_items(arguments: &[Argument<'_>]) -> Vec<Item> {
    arguments
        .iter()
        .map(|argument| match argument {
            Argument::SpreadElement(spread) => Item::Spread(spread.argument.span()),
            argument => Item::Plain(argument.span()),
        })
        .collect()
}

fn element_items(elements: &[ArrayExpressionElement<'_>]) -> Vec<Item> {
    elements
        .iter()
        .map(|element| match element {
            ArrayExpressionElement::SpreadElement(spread) => Item::Spread(spread.argument.span()),
            ArrayExpressionElement::Elision(_) => Item::Hole,
            element => Item::Plain(element.span()),
        })
        .collect()
}

fn has_spread(arguments: &[Argument<'_>]) -> bool {
    arguments
        .iter()
        .any(|argument| matches!(argument, Argument::SpreadElement(_)))
}

impl<'a> Visit<'a> for Lowering<'_> {
    fn visit_program(&mut self, program: &Program<'a>) {
        let at = program
            .directives
            .last()
            .map(|directive| directive.span.end)
            .or_else(|| program.hashbang.as_ref().map(|hashbang| hashbang.span.end))
            .unwrap_or(program.span.start);
        self.frames.push(Frame::new(at));
        walk::walk_program(self, program);
        self.close_frame();
    }

    fn visit_function(&mut self, func: &Function<'a>, flags: ScopeFlags) {
        if func.generator {
            self.unsupported(func.span, "generator function");
        }
        if func.r#async {
            self.unsupported(func.span, "async function");
        }
        let Some(body) = &func.body else {
            walk::walk_function(self, func, flags);
            return;
        };
        let at = body
            .directives
            .last()
            .map_or(body.span.start + 1, |directive| directive.span.end);
        self.frames.push(Frame::new(at));
        walk::walk_function(self, func, flags);
        self.lower_params(&func.params);
        self.close_frame();
    }

    fn visit_arrow_function_expression(&mut self, arrow: &ArrowFunctionExpression<'a>) {
        self.unsupported(arrow.span, "arrow function");
        walk::walk_arrow_function_expression(self, arrow);
    }

    fn visit_variable_declaration(&mut self, decl: &VariableDeclaration<'a>) {
        walk::walk_variable_declaration(self, decl);
        let keyword = match decl.kind {
            VariableDeclarationKind::Var => return,
            VariableDeclarationKind::Let => "let",
            VariableDeclarationKind::Const => "const",
            VariableDeclarationKind::Using | VariableDeclarationKind::AwaitUsing => {
                self.unsupported(decl.span, "`using` declaration");
                return;
            }
        };
        let start = decl.span.start;
        if self.source[start as usize..].starts_with(keyword) {
            self.edit(start, start + keyword.len() as u32, Code::text("var", start));
        }
    }

    fn visit_variable_declarator(&mut self, declarator: &VariableDeclarator<'a>) {
        walk::walk_variable_declarator(self, declarator);
        if matches!(declarator.id, BindingPattern::BindingIdentifier(_)) {
            return;
        }
        // `for...in`/`for...of` heads have no initializer
        let Some(init) = &declarator.init else {
            return;
        };
        let value = self.render_span(init.span());
        let mut bindings = Vec::new();
        self.bind(&declarator.id, value, true, &mut bindings);
        self.replace(
            declarator.span,
            Code::join(bindings, ", ", declarator.span.start),
        );
    }

    fn visit_template_literal(&mut self, literal: &TemplateLiteral<'a>) {
        walk::walk_template_literal(self, literal);
        let wrap = !literal.expressions.is_empty();
        let mut code = Code::default();
        if wrap {
            code.push("(", literal.span.start);
        }
        for (index, quasi) in literal.quasis.iter().enumerate() {
            let cooked = quasi
                .value
                .cooked
                .as_ref()
                .map_or(quasi.value.raw.as_str(), |cooked| cooked.as_str());
            if index == 0 {
                code.push(js_string(cooked), quasi.span.start);
            } else if !cooked.is_empty() {
                code.push(format!(" + {}", js_string(cooked)), quasi.span.start);
            }
            if let Some(expression) = literal.expressions.get(index) {
                let span = expression.span();
                code.push(" + (", span.start);
                code.append(self.render_span(span));
                code.push(")", span.end);
            }
        }
        if wrap {
            code.push(")", literal.span.end);
        }
        self.replace(literal.span, code);
    }

    fn visit_tagged_template_expression(&mut self, tagged: &TaggedTemplateExpression<'a>) {
        walk::walk_tagged_template_expression(self, tagged);
        let quasi = &tagged.quasi;
        let cooked = quasi
            .quasis
            .iter()
            .map(|q| q.value.cooked.as_ref().map_or_else(|| "void 0".to_string(), |c| js_string(c)))
            .collect::<Vec<_>>()
            .join(", ");
        let raw = quasi
            .quasis
            .iter()
            .map(|q| js_string(&q.value.raw))
            .collect::<Vec<_>>()
            .join(", ");

        let mut code = self.render_span(tagged.tag.span());
        code.push(
            format!("(Object.defineProperty([{cooked}], \"raw\", {{ value: [{raw}] }})"),
            quasi.span.start,
        );
        for expression in &quasi.expressions {
            let span = expression.span();
            code.push(", ", span.start);
            code.append(self.render_span(span));
        }
        code.push(")", tagged.span.end);
        self.replace(tagged.span, code);
    }

    fn visit_object_property(&mut self, property: &ObjectProperty<'a>) {
        walk::walk_object_property(self, property);
        // Computed keys are handled for the whole literal
        if property.computed {
            return;
        }
        let origin = property.span.start;
        if property.method && matches!(property.kind, PropertyKind::Init) {
            let mut code = self.render_span(property.key.span());
            code.push(": ", origin);
            code.append(self.property_value(property));
            self.replace(property.span, code);
        } else if property.shorthand {
            let mut code = self.render_span(property.key.span());
            code.push(": ", origin);
            code.append(self.render_span(property.value.span()));
            self.replace(property.span, code);
        }
    }

    fn visit_object_expression(&mut self, object: &ObjectExpression<'a>) {
        walk::walk_object_expression(self, object);
        let Some(first) = object.properties.iter().position(|property| {
            matches!(property, ObjectPropertyKind::ObjectProperty(property) if property.computed)
        }) else {
            return;
        };

        let origin = object.span.start;
        let name = self.temp("obj");
        let leading = object.properties[..first]
            .iter()
            .map(|property| self.render_span(property.span()))
            .collect();
        let mut head = Code::text(format!("{name} = {{"), origin);
        head.append(Code::join(leading, ", ", origin));
        head.push("}", origin);

        let mut parts = vec![head];
        for property in &object.properties[first..] {
            match property {
                ObjectPropertyKind::ObjectProperty(property) => {
                    parts.push(self.assign_property(&name, property));
                }
                ObjectPropertyKind::SpreadProperty(spread) => {
                    self.unsupported(spread.span, "object spread");
                }
            }
        }
        parts.push(Code::text(name, object.span.end));

        let mut code = Code::text("(", origin);
        code.append(Code::join(parts, ", ", origin));
        code.push(")", object.span.end);
        self.replace(object.span, code);
    }

    fn visit_class(&mut self, class: &Class<'a>) {
        let parent = class.super_class.as_ref().map(|_| self.fresh("super"));
        self.classes.push(ClassScope {
            parent: parent.clone(),
            static_member: false,
        });
        walk::walk_class(self, class);
        self.classes.pop();
        self.lower_class(class, parent);
    }

    fn visit_method_definition(&mut self, method: &MethodDefinition<'a>) {
        let outer = self
            .classes
            .last_mut()
            .map(|scope| std::mem::replace(&mut scope.static_member, method.r#static));
        walk::walk_method_definition(self, method);
        if let (Some(scope), Some(outer)) = (self.classes.last_mut(), outer) {
            scope.static_member = outer;
        }
    }

    fn visit_property_definition(&mut self, property: &PropertyDefinition<'a>) {
        self.unsupported(property.span, "class field");
        walk::walk_property_definition(self, property);
    }

    fn visit_static_block(&mut self, block: &StaticBlock<'a>) {
        self.unsupported(block.span, "static block");
        walk::walk_static_block(self, block);
    }

    fn visit_export_default_declaration(&mut self, export: &ExportDefaultDeclaration<'a>) {
        walk::walk_export_default_declaration(self, export);
        // `export default var` is invalid: declare first, export the name
        if let ExportDefaultDeclarationKind::ClassDeclaration(class) = &export.declaration
            && let Some(id) = &class.id
        {
            let mut code = self.render_span(class.span);
            code.push(format!("\nexport default {};", id.name), export.span.end);
            self.replace(export.span, code);
        }
    }

    fn visit_static_member_expression(&mut self, member: &StaticMemberExpression<'a>) {
        walk::walk_static_member_expression(self, member);
        if let Expression::Super(sup) = &member.object {
            let access = Code::text(format!(".{}", member.property.name), member.property.span.start);
            if let Some(code) = self.super_member(sup.span, access) {
                self.replace(member.span, code);
            }
        }
    }

    fn visit_computed_member_expression(&mut self, member: &ComputedMemberExpression<'a>) {
        walk::walk_computed_member_expression(self, member);
        if let Expression::Super(sup) = &member.object {
            let span = member.expression.span();
            let mut access = Code::text("[", span.start);
            access.append(self.render_span(span));
            access.push("]", span.end);
            if let Some(code) = self.super_member(sup.span, access) {
                self.replace(member.span, code);
            }
        }
    }

    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        walk::walk_call_expression(self, call);
        let origin = call.span.start;
        let spread = has_spread(&call.arguments);

        // `super(...)` and `super.method(...)` run against `this`
        let callee = match &call.callee {
            Expression::Super(sup) => match self.parent_class(sup.span) {
                Some(parent) => Some(Code::text(parent, sup.span.start)),
                None => return,
            },
            Expression::StaticMemberExpression(member) if matches!(member.object, Expression::Super(_)) => {
                Some(self.render_span(member.span))
            }
            Expression::ComputedMemberExpression(member) if matches!(member.object, Expression::Super(_)) => {
                Some(self.render_span(member.span))
            }
            _ => None,
        };
        let Some(mut code) = callee else {
            if spread {
                self.lower_spread_call(call);
            }
            return;
        };
        if spread {
            code.push(".apply(this, ", origin);
            code.append(self.spread_array(&argument_items(&call.arguments), origin));
        } else {
            code.push(".call(this", origin);
            for argument in &call.arguments {
                let span = argument.span();
                code.push(", ", span.start);
                code.append(self.render_span(span));
            }
        }
        code.push(")", call.span.end);
        self.replace(call.span, code);
    }

    fn visit_new_expression(&mut self, new: &NewExpression<'a>) {
        walk::walk_new_expression(self, new);
        if !has_spread(&new.arguments) {
            return;
        }
        let origin = new.span.start;
        let mut code = Code::text("new (Function.prototype.bind.apply(", origin);
        code.append(self.render_span(new.callee.span()));
        code.push(", [null].concat(", origin);
        code.append(self.spread_array(&argument_items(&new.arguments), origin));
        code.push(")))()", new.span.end);
        self.replace(new.span, code);
    }

    fn visit_array_expression(&mut self, array: &ArrayExpression<'a>) {
        walk::walk_array_expression(self, array);
        let items = element_items(&array.elements);
        if items.iter().any(|item| matches!(item, Item::Spread(_))) {
            let code = self.spread_array(&items, array.span.start);
            self.replace(array.span, code);
        }
    }

    fn visit_for_of_statement(&mut self, stmt: &ForOfStatement<'a>) {
        walk::walk_for_of_statement(self, stmt);
        if stmt.r#await {
            self.unsupported(stmt.span, "`for await`");
            return;
        }
        let origin = stmt.span.start;
        let index = self.fresh("i");
        let list = self.fresh("list");
        let item = Code::text(format!("{list}[{index}]"), stmt.left.span().start);

        let binding = match &stmt.left {
            ForStatementLeft::VariableDeclaration(decl) => {
                let Some(declarator) = decl.declarations.first() else {
                    return;
                };
                let mut bindings = Vec::new();
                self.bind(&declarator.id, item, true, &mut bindings);
                let mut code = Code::text("var ", decl.span.start);
                code.append(Code::join(bindings, ", ", decl.span.start));
                code.push(";", decl.span.end);
                code
            }
            left => {
                let Some(target) = left.as_assignment_target() else {
                    return;
                };
                let mut assignments = Vec::new();
                self.assign(target, item, &mut assignments);
                let mut code = Code::join(assignments, ", ", origin);
                code.push(";", left.span().end);
                code
            }
        };

        let right = stmt.right.span();
        let mut code = Code::text(format!("for (var {index} = 0, {list} = "), origin);
        code.append(self.render_span(right));
        code.push(format!("; {index} < {list}.length; {index}++) {{\n"), right.end);
        code.append(binding);
        code.push("\n", origin);
        code.append(self.render_span(stmt.body.span()));
        code.push("\n}", stmt.span.end);
        self.replace(stmt.span, code);
    }

    fn visit_assignment_expression(&mut self, assignment: &AssignmentExpression<'a>) {
        walk::walk_assignment_expression(self, assignment);
        if !matches!(
            assignment.left,
            AssignmentTarget::ArrayAssignmentTarget(_) | AssignmentTarget::ObjectAssignmentTarget(_)
        ) {
            return;
        }
        let origin = assignment.span.start;
        let name = self.temp("ref");
        let mut value = Code::text(format!("{name} = "), origin);
        value.append(self.render_span(assignment.right.span()));
        let mut parts = vec![value];
        self.assign(&assignment.left, Code::text(name.clone(), origin), &mut parts);
        parts.push(Code::text(name, assignment.span.end));

        let mut code = Code::text("(", origin);
        code.append(Code::join(parts, ", ", origin));
        code.push(")", assignment.span.end);
        self.replace(assignment.span, code);
    }

    fn visit_catch_clause(&mut self, clause: &CatchClause<'a>) {
        walk::walk_catch_clause(self, clause);
        let Some(param) = &clause.param else {
            return;
        };
        if matches!(param.pattern, BindingPattern::BindingIdentifier(_)) {
            return;
        }
        let origin = param.span.start;
        let name = self.fresh("error");
        let mut bindings = Vec::new();
        self.bind(&param.pattern, Code::text(name.clone(), origin), true, &mut bindings);
        let mut prologue = Code::text("\nvar ", origin);
        prologue.append(Code::join(bindings, ", ", origin));
        prologue.push(";", param.span.end);

        let pattern = param.pattern.span();
        self.replace(pattern, Code::text(name, pattern.start));
        let at = clause.body.span.start + 1;
        self.edit(at, at, prologue);
    }
}

/// Line starts of the input.
struct Lines {
    starts: Vec<u32>,
}

impl Lines {
    fn new(source: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(index, _)| index as u32 + 1))
            .collect();
        Self { starts }
    }

    /// Zero-based line and UTF-16 column of `offset`.
    fn locate(&self, source: &str, offset: u32) -> (u32, u32) {
        let line = self
            .starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let start = self.starts.get(line).copied().unwrap_or_default();
        let column = source
            .get(start as usize..offset as usize)
            .map_or(0, |prefix| prefix.encode_utf16().count());
        (line as u32, column as u32)
    }
}

/// Render `code` and map every token it copies from `source`.
fn emit(source: &str, code: &Code, filename: &str) -> Result<(String, String), String> {
    let lines = Lines::new(source);
    let mut map = SourceMap::new("/");
    let source_index = map.add_source(filename);
    let mut out = String::with_capacity(source.len());
    let mut generated = (0u32, 0u32);

    for piece in &code.0 {
        match piece {
            Piece::Source(start, end) => {
                let mut original = lines.locate(source, *start);
                let mut previous: Option<char> = None;
                for c in source[*start as usize..*end as usize].chars() {
                    let token_start =
                        !c.is_whitespace() && !(previous.is_some_and(is_word) && is_word(c));
                    if token_start {
                        map.add_mapping(
                            generated.0,
                            generated.1,
                            Some(OriginalLocation::new(original.0, original.1, source_index, None)),
                        );
                    }
                    advance(&mut generated, c);
                    advance(&mut original, c);
                    out.push(c);
                    previous = Some(c);
                }
            }
            Piece::Text(text, origin) => {
                let (line, column) = lines.locate(source, *origin);
                map.add_mapping(
                    generated.0,
                    generated.1,
                    Some(OriginalLocation::new(line, column, source_index, None)),
                );
                for c in text.chars() {
                    advance(&mut generated, c);
                }
                out.push_str(text);
            }
        }
    }

    let map = map
        .to_json(None)
        .map_err(|err| format!("cannot write source map: {err}"))?;
    Ok((out, map))
}

fn advance(position: &mut (u32, u32), c: char) {
    if c == '\n' {
        position.0 += 1;
        position.1 = 0;
    } else {
        position.1 += c.len_utf16() as u32;
    }
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// `value` as a double-quoted ES5 string literal.
fn js_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c < ' ' => {
                let _ = write!(out, "\\x{:02x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lowered(source: &str) -> String {
        lower(source, "app.js").unwrap().0
    }

    /// Lowering the output again changes nothing: no ES2015 syntax is left.
    fn assert_fully_lowered(code: &str) {
        assert_eq!(lowered(code), code, "second pass rewrote:\n{code}");
    }

    #[test]
    fn test_block_bindings_become_var() {
        let out = lowered("const a = 1;\nlet b = a;\nfor (let i = 0; i < b; i++) {}\n");
        assert_eq!(out, "var a = 1;\nvar b = a;\nfor (var i = 0; i < b; i++) {}\n");
    }

    #[test]
    fn test_template_literal_concatenates() {
        let out = lowered("var s = `a${b}c\\n${d}`;\nvar t = `plain`;\n");
        assert!(out.contains(r#"var s = ("a" + (b) + "c\n" + (d));"#), "{out}");
        assert!(out.contains(r#"var t = "plain";"#), "{out}");
        assert_fully_lowered(&out);
    }

    #[test]
    fn test_tagged_template_calls_tag() {
        let out = lowered("tag`x${y}z`;\n");
        assert!(
            out.starts_with(r#"tag(Object.defineProperty(["x", "z"], "raw", { value: ["x", "z"] }), y)"#),
            "{out}"
        );
    }

    #[test]
    fn test_object_shorthands() {
        let out = lowered("var o = { a, f(x) { return x; }, get g() { return 1; } };\n");
        assert!(out.contains("a: a"), "{out}");
        assert!(out.contains("f: function (x) { return x; }"), "{out}");
        assert!(out.contains("get g() { return 1; }"), "{out}");
        assert_fully_lowered(&out);
    }

    #[test]
    fn test_computed_keys_assign_in_order() {
        let out = lowered("var o = { a: 1, [k]: 2, b: 3 };\n");
        assert!(out.contains("(_obj = {a: 1}, _obj[k] = 2, _obj.b = 3, _obj)"), "{out}");
        assert!(out.starts_with("\nvar _obj;"), "{out}");
        assert_fully_lowered(&out);
    }

    #[test]
    fn test_parameter_defaults_and_rest() {
        let out = lowered("function f(a, b = a + 1, ...rest) { return rest; }\n");
        assert!(out.starts_with("function f(a, b) {"), "{out}");
        assert!(out.contains("if (b === void 0) b = a + 1;"), "{out}");
        assert!(out.contains("var rest = Array.prototype.slice.call(arguments, 2);"), "{out}");
        assert_fully_lowered(&out);
    }

    #[test]
    fn test_destructuring_declaration() {
        let out = lowered("const { a, b: [c] } = obj;\n");
        assert_eq!(out, "var a = obj.a, _ref = obj.b, c = _ref[0];\n");
    }

    #[test]
    fn test_destructuring_default_and_parameter() {
        let out = lowered("function f({ x = 1 }) { return x; }\n");
        assert!(out.starts_with("function f(_param) {"), "{out}");
        assert!(out.contains("var _ref = _param.x, x = (_ref === void 0 ? 1 : _ref);"), "{out}");
        assert_fully_lowered(&out);
    }

    #[test]
    fn test_destructuring_assignment_uses_function_temp() {
        let out = lowered("function swap() { [a, b] = [b, a]; }\n");
        assert!(out.contains("var _ref;"), "{out}");
        assert!(out.contains("(_ref = [b, a], a = _ref[0], b = _ref[1], _ref);"), "{out}");
        assert_fully_lowered(&out);
    }

    #[test]
    fn test_class_becomes_constructor_function() {
        let source = "class Box extends Base {\n  constructor(v) { super(v); this.v = v; }\n  get value() { return this.v; }\n  show() { return super.show(); }\n  static of(v) { return new Box(v); }\n}\n";
        let out = lowered(source);
        assert!(out.starts_with("var Box = (function (_super) {\nfunction Box(v) { _super.call(this, v); this.v = v; }"), "{out}");
        assert!(out.contains("Box.prototype = Object.create(_super && _super.prototype"), "{out}");
        assert!(out.contains("Box.prototype.show = function () { return _super.prototype.show.call(this); };"), "{out}");
        assert!(out.contains("Box.of = function (v) { return new Box(v); };"), "{out}");
        assert!(out.contains("Object.defineProperty(Box.prototype, \"value\", { get: function () { return this.v; },"), "{out}");
        assert!(out.contains("return Box;\n})(Base);"), "{out}");
        assert!(!out.contains("class "), "{out}");
        assert_fully_lowered(&out);
    }

    #[test]
    fn test_class_expression_and_default_export() {
        let out = lowered("var A = class {};\nexport default class B {}\n");
        assert!(out.contains("var A = (function () {\nfunction _class() {}"), "{out}");
        assert!(out.contains("var B = (function () {"), "{out}");
        assert!(out.contains("\nexport default B;"), "{out}");
        assert_fully_lowered(&out);
    }

    #[test]
    fn test_for_of_indexes() {
        let out = lowered("for (const [k, v] of pairs) { use(k, v); }\n");
        assert!(out.starts_with("for (var _i = 0, _list = pairs; _i < _list.length; _i++) {\nvar _ref = _list[_i], k = _ref[0], v = _ref[1];"), "{out}");
        assert!(out.contains("{ use(k, v); }"), "{out}");
        assert_fully_lowered(&out);
    }

    #[test]
    fn test_spread_calls_and_arrays() {
        let out = lowered("f(...args);\nobj.m(1, ...xs);\nvar all = [0, ...xs];\nnew C(...xs);\n");
        assert!(out.contains("f.apply(void 0, [].concat(Array.prototype.slice.call(args)));"), "{out}");
        assert!(out.contains("obj.m.apply(obj, [1].concat(Array.prototype.slice.call(xs)));"), "{out}");
        assert!(out.contains("var all = [0].concat(Array.prototype.slice.call(xs));"), "{out}");
        assert!(out.contains("new (Function.prototype.bind.apply(C, [null].concat([].concat(Array.prototype.slice.call(xs)))))()"), "{out}");
        assert_fully_lowered(&out);
    }

    #[test]
    fn test_nested_rewrites_compose() {
        let out = lowered("const f = function (...xs) { return `n=${[...xs].length}`; };\n");
        assert!(out.contains("(\"n=\" + ([].concat(Array.prototype.slice.call(xs)).length))"), "{out}");
        assert_fully_lowered(&out);
    }

    #[test]
    fn test_generator_is_rejected() {
        let err = lower("function* gen() { yield 1; }\n", "app.js").unwrap_err();
        assert!(err.contains("1:1: generator function cannot be lowered to ES5"), "{err}");
    }

    #[test]
    fn test_map_points_at_input_lines() {
        let source = "var a = 1;\nconst b = `x${a}`;\nvar c = b;\n";
        let (code, map) = lower(source, "app.js").unwrap();
        let mut map = SourceMap::from_json("/", &map).unwrap();

        let line = code.lines().position(|line| line.starts_with("var c")).unwrap() as u32;
        let mapping = map.find_closest_mapping(line, 4).unwrap();
        let original = mapping.original.unwrap();
        assert_eq!((original.original_line, original.original_column), (2, 4));
    }
}

//! Recursive descent parser for GraphQL documents.
//!
//! The parser accumulates diagnostics instead of failing fast; callers must
//! check [`ParseResult::diagnostics`] before using the document.

use crate::ast::*;
use crate::lexer::{decode_block_string, decode_string, Lexer};
use crate::token::{Token, TokenKind};
use specql_core::{codes, DiagnosticBag, Span};

const MAX_DEPTH: u32 = 128;

/// Parser for GraphQL documents.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    last_end: u32,
    depth: u32,
    diagnostics: DiagnosticBag,
}

/// Result of parsing.
pub struct ParseResult {
    pub document: Document,
    pub diagnostics: DiagnosticBag,
}

/// Parses a source string into a document.
pub fn parse(source: &str) -> ParseResult {
    let mut parser = Parser::new(source);
    let document = parser.parse_document();
    ParseResult {
        document,
        diagnostics: parser.diagnostics,
    }
}

impl<'a> Parser<'a> {
    /// Creates a new parser.
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            last_end: 0,
            depth: 0,
            diagnostics: DiagnosticBag::new(),
        }
    }

    /// Returns the current token kind.
    #[inline]
    fn at(&self) -> TokenKind {
        self.current.kind
    }

    /// Returns true if at the given kind.
    #[inline]
    fn at_kind(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Returns true if at a name token with the given text.
    fn at_keyword(&self, keyword: &str) -> bool {
        self.at_kind(TokenKind::Name) && self.current_text() == keyword
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        self.last_end = self.current.span.end;
        self.current = self.lexer.next_token();
    }

    /// Expects a specific token kind, reporting an error on mismatch.
    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.at_kind(kind) {
            self.advance();
            true
        } else {
            self.error_expected(kind);
            false
        }
    }

    /// Gets the text of the current token.
    fn current_text(&self) -> &'a str {
        self.lexer.span_text(self.current.span)
    }

    /// Reports an error at the current token.
    fn error(&mut self, code: &str, message: impl Into<String>) {
        self.diagnostics
            .error(code, message.into(), self.current.span);
    }

    /// Reports an expected token error.
    fn error_expected(&mut self, expected: TokenKind) {
        let code = if self.at_kind(TokenKind::Eof) {
            codes::UNEXPECTED_EOF
        } else {
            codes::UNEXPECTED_TOKEN
        };
        let message = format!("expected {}, found {}", expected, self.at());
        self.error(code, message);
    }

    /// Expects a name token, returning a placeholder on failure.
    fn expect_name(&mut self, what: &str) -> Name {
        if self.at_kind(TokenKind::Name) {
            let name = Name::new(self.current_text(), self.current.span);
            self.advance();
            name
        } else {
            self.error(
                codes::UNEXPECTED_TOKEN,
                format!("expected {what}, found {}", self.at()),
            );
            Name::new("", Span::empty(self.current.span.start))
        }
    }

    /// Parses a document.
    pub fn parse_document(&mut self) -> Document {
        let start = self.current.span.start;
        let mut definitions = Vec::new();

        while !self.at_kind(TokenKind::Eof) {
            if let Some(def) = self.parse_definition() {
                definitions.push(def);
            } else {
                // Recovery: skip to next definition
                self.advance();
            }
        }

        Document {
            definitions,
            span: Span::new(start, self.last_end),
        }
    }

    /// Parses a definition.
    fn parse_definition(&mut self) -> Option<Definition> {
        let description = self.try_parse_description();

        match self.at() {
            // Query shorthand: a bare selection set.
            TokenKind::LBrace => {
                let start = self.current.span.start;
                let selection_set = self.parse_selection_set()?;
                Some(Definition::Operation(OperationDefinition {
                    operation: OperationType::Query,
                    name: None,
                    variables: Vec::new(),
                    directives: Vec::new(),
                    span: Span::new(start, selection_set.span.end),
                    selection_set,
                }))
            }
            TokenKind::Name => match self.current_text() {
                "schema" => Some(Definition::Schema(self.parse_schema_definition())),
                "type" => Some(Definition::Type(TypeDefinition::Object(
                    self.parse_object_type(description),
                ))),
                "interface" => Some(Definition::Type(TypeDefinition::Interface(
                    self.parse_interface_type(description),
                ))),
                "union" => Some(Definition::Type(TypeDefinition::Union(
                    self.parse_union_type(description),
                ))),
                "enum" => Some(Definition::Type(TypeDefinition::Enum(
                    self.parse_enum_type(description),
                ))),
                "input" => Some(Definition::Type(TypeDefinition::Input(
                    self.parse_input_type(description),
                ))),
                "scalar" => Some(Definition::Type(TypeDefinition::Scalar(
                    self.parse_scalar_type(description),
                ))),
                "directive" => Some(Definition::Directive(
                    self.parse_directive_definition(description),
                )),
                "query" | "mutation" | "subscription" => {
                    self.parse_operation_definition().map(Definition::Operation)
                }
                "fragment" => self.parse_fragment_definition().map(Definition::Fragment),
                other => {
                    self.error(
                        codes::INVALID_SYNTAX,
                        format!("unexpected name '{other}' at document level"),
                    );
                    None
                }
            },
            _ => {
                let message = format!("expected a definition, found {}", self.at());
                self.error(codes::INVALID_SYNTAX, message);
                None
            }
        }
    }

    /// Parses an optional description string.
    fn try_parse_description(&mut self) -> Option<Description> {
        let span = self.current.span;
        match self.at() {
            TokenKind::StringLit => {
                let raw = self.current_text();
                let value = decode_string(raw).unwrap_or_default();
                self.advance();
                Some(Description::new(value, span))
            }
            TokenKind::BlockStringLit => {
                let value = decode_block_string(self.current_text());
                self.advance();
                Some(Description::new(value, span))
            }
            _ => None,
        }
    }

    /// Parses `schema { query: Query ... }`.
    fn parse_schema_definition(&mut self) -> SchemaDefinition {
        let start = self.current.span.start;
        self.advance(); // schema
        let directives = self.parse_directives();
        let mut operations = Vec::new();

        if self.expect(TokenKind::LBrace) {
            while !self.at_kind(TokenKind::RBrace) && !self.at_kind(TokenKind::Eof) {
                let op_start = self.current.span.start;
                let keyword = self.expect_name("operation type");
                let operation = match keyword.value.as_str() {
                    "query" => OperationType::Query,
                    "mutation" => OperationType::Mutation,
                    "subscription" => OperationType::Subscription,
                    other => {
                        self.diagnostics.error(
                            codes::INVALID_SYNTAX,
                            format!("'{other}' is not an operation type"),
                            keyword.span,
                        );
                        break;
                    }
                };
                self.expect(TokenKind::Colon);
                let type_name = self.expect_name("type name");
                operations.push(RootOperationTypeDefinition {
                    operation,
                    span: Span::new(op_start, type_name.span.end),
                    type_name,
                });
            }
            self.expect(TokenKind::RBrace);
        }

        SchemaDefinition {
            directives,
            operations,
            span: Span::new(start, self.last_end),
        }
    }

    /// Parses `type Name implements A & B { fields }`.
    fn parse_object_type(&mut self, description: Option<Description>) -> ObjectTypeDefinition {
        let start = self.current.span.start;
        self.advance(); // type
        let name = self.expect_name("type name");
        let implements = self.parse_implements();
        let directives = self.parse_directives();
        let fields = self.parse_field_definitions();

        ObjectTypeDefinition {
            description,
            name,
            implements,
            directives,
            fields,
            span: Span::new(start, self.last_end),
        }
    }

    /// Parses `interface Name { fields }`.
    fn parse_interface_type(
        &mut self,
        description: Option<Description>,
    ) -> InterfaceTypeDefinition {
        let start = self.current.span.start;
        self.advance(); // interface
        let name = self.expect_name("interface name");
        let directives = self.parse_directives();
        let fields = self.parse_field_definitions();

        InterfaceTypeDefinition {
            description,
            name,
            directives,
            fields,
            span: Span::new(start, self.last_end),
        }
    }

    /// Parses `union Name = A | B`.
    fn parse_union_type(&mut self, description: Option<Description>) -> UnionTypeDefinition {
        let start = self.current.span.start;
        self.advance(); // union
        let name = self.expect_name("union name");
        let directives = self.parse_directives();
        let mut members = Vec::new();

        if self.expect(TokenKind::Equals) {
            if self.at_kind(TokenKind::Pipe) {
                self.advance();
            }
            members.push(self.expect_name("member type name"));
            while self.at_kind(TokenKind::Pipe) {
                self.advance();
                members.push(self.expect_name("member type name"));
            }
        }

        UnionTypeDefinition {
            description,
            name,
            directives,
            members,
            span: Span::new(start, self.last_end),
        }
    }

    /// Parses `enum Name { VALUE ... }`.
    fn parse_enum_type(&mut self, description: Option<Description>) -> EnumTypeDefinition {
        let start = self.current.span.start;
        self.advance(); // enum
        let name = self.expect_name("enum name");
        let directives = self.parse_directives();
        let mut values = Vec::new();

        if self.expect(TokenKind::LBrace) {
            while !self.at_kind(TokenKind::RBrace) && !self.at_kind(TokenKind::Eof) {
                let value_description = self.try_parse_description();
                let value_start = self.current.span.start;
                let value_name = self.expect_name("enum value");
                if value_name.value.is_empty() {
                    break;
                }
                let value_directives = self.parse_directives();
                values.push(EnumValueDefinition {
                    description: value_description,
                    name: value_name,
                    directives: value_directives,
                    span: Span::new(value_start, self.last_end),
                });
            }
            self.expect(TokenKind::RBrace);
        }

        EnumTypeDefinition {
            description,
            name,
            directives,
            values,
            span: Span::new(start, self.last_end),
        }
    }

    /// Parses `input Name { fields }`.
    fn parse_input_type(&mut self, description: Option<Description>) -> InputObjectTypeDefinition {
        let start = self.current.span.start;
        self.advance(); // input
        let name = self.expect_name("input type name");
        let directives = self.parse_directives();
        let mut fields = Vec::new();

        if self.expect(TokenKind::LBrace) {
            while !self.at_kind(TokenKind::RBrace) && !self.at_kind(TokenKind::Eof) {
                match self.parse_input_value_definition() {
                    Some(field) => fields.push(field),
                    None => break,
                }
            }
            self.expect(TokenKind::RBrace);
        }

        InputObjectTypeDefinition {
            description,
            name,
            directives,
            fields,
            span: Span::new(start, self.last_end),
        }
    }

    /// Parses `scalar Name`.
    fn parse_scalar_type(&mut self, description: Option<Description>) -> ScalarTypeDefinition {
        let start = self.current.span.start;
        self.advance(); // scalar
        let name = self.expect_name("scalar name");
        let directives = self.parse_directives();

        ScalarTypeDefinition {
            description,
            name,
            directives,
            span: Span::new(start, self.last_end),
        }
    }

    /// Parses `directive @name(args) repeatable? on LOCATION | ...`.
    fn parse_directive_definition(
        &mut self,
        description: Option<Description>,
    ) -> DirectiveDefinition {
        let start = self.current.span.start;
        self.advance(); // directive
        self.expect(TokenKind::At);
        let name = self.expect_name("directive name");
        let arguments = self.parse_arguments_definition();
        let repeatable = if self.at_keyword("repeatable") {
            self.advance();
            true
        } else {
            false
        };

        let mut locations = Vec::new();
        if self.at_keyword("on") {
            self.advance();
            if self.at_kind(TokenKind::Pipe) {
                self.advance();
            }
            locations.push(self.expect_name("directive location"));
            while self.at_kind(TokenKind::Pipe) {
                self.advance();
                locations.push(self.expect_name("directive location"));
            }
        } else {
            self.error(codes::INVALID_SYNTAX, "expected 'on' in directive definition");
        }

        DirectiveDefinition {
            description,
            name,
            arguments,
            repeatable,
            locations,
            span: Span::new(start, self.last_end),
        }
    }

    /// Parses `implements A & B`.
    fn parse_implements(&mut self) -> Vec<Name> {
        let mut implements = Vec::new();
        if self.at_keyword("implements") {
            self.advance();
            if self.at_kind(TokenKind::Amp) {
                self.advance();
            }
            implements.push(self.expect_name("interface name"));
            while self.at_kind(TokenKind::Amp) {
                self.advance();
                implements.push(self.expect_name("interface name"));
            }
        }
        implements
    }

    /// Parses a `{ field... }` block of field definitions.
    fn parse_field_definitions(&mut self) -> Vec<FieldDefinition> {
        let mut fields = Vec::new();
        if self.expect(TokenKind::LBrace) {
            while !self.at_kind(TokenKind::RBrace) && !self.at_kind(TokenKind::Eof) {
                let description = self.try_parse_description();
                let start = self.current.span.start;
                let name = self.expect_name("field name");
                if name.value.is_empty() {
                    break;
                }
                let arguments = self.parse_arguments_definition();
                self.expect(TokenKind::Colon);
                let ty = self.parse_type();
                let directives = self.parse_directives();
                fields.push(FieldDefinition {
                    description,
                    name,
                    arguments,
                    ty,
                    directives,
                    span: Span::new(start, self.last_end),
                });
            }
            self.expect(TokenKind::RBrace);
        }
        fields
    }

    /// Parses `(arg: Type = default, ...)`; empty when absent.
    fn parse_arguments_definition(&mut self) -> Vec<InputValueDefinition> {
        let mut arguments = Vec::new();
        if self.at_kind(TokenKind::LParen) {
            self.advance();
            while !self.at_kind(TokenKind::RParen) && !self.at_kind(TokenKind::Eof) {
                match self.parse_input_value_definition() {
                    Some(argument) => arguments.push(argument),
                    None => break,
                }
            }
            self.expect(TokenKind::RParen);
        }
        arguments
    }

    /// Parses a single `name: Type = default @directives` input value.
    fn parse_input_value_definition(&mut self) -> Option<InputValueDefinition> {
        let description = self.try_parse_description();
        let start = self.current.span.start;
        let name = self.expect_name("argument name");
        if name.value.is_empty() {
            return None;
        }
        self.expect(TokenKind::Colon);
        let ty = self.parse_type();
        let default_value = if self.at_kind(TokenKind::Equals) {
            self.advance();
            self.parse_value(true)
        } else {
            None
        };
        let directives = self.parse_directives();

        Some(InputValueDefinition {
            description,
            name,
            ty,
            default_value,
            directives,
            span: Span::new(start, self.last_end),
        })
    }

    /// Parses a type reference: `Name`, `[T]`, with `!` suffixes.
    fn parse_type(&mut self) -> Type {
        let start = self.current.span.start;
        let mut ty = if self.at_kind(TokenKind::LBracket) {
            self.advance();
            let inner = self.parse_type();
            self.expect(TokenKind::RBracket);
            Type::List(Box::new(inner), Span::new(start, self.last_end))
        } else {
            let name = self.expect_name("type name");
            Type::Named(NamedType {
                name: name.value,
                span: name.span,
            })
        };

        if self.at_kind(TokenKind::Bang) {
            self.advance();
            ty = Type::NonNull(Box::new(ty), Span::new(start, self.last_end));
        }
        ty
    }

    /// Parses an operation definition starting at its keyword.
    fn parse_operation_definition(&mut self) -> Option<OperationDefinition> {
        let start = self.current.span.start;
        let operation = match self.current_text() {
            "query" => OperationType::Query,
            "mutation" => OperationType::Mutation,
            _ => OperationType::Subscription,
        };
        self.advance();

        let name = if self.at_kind(TokenKind::Name) {
            let name = Name::new(self.current_text(), self.current.span);
            self.advance();
            Some(name)
        } else {
            None
        };

        let variables = self.parse_variable_definitions();
        let directives = self.parse_directives();
        let selection_set = self.parse_selection_set()?;

        Some(OperationDefinition {
            operation,
            name,
            variables,
            directives,
            span: Span::new(start, selection_set.span.end),
            selection_set,
        })
    }

    /// Parses `($var: Type = default, ...)`; empty when absent.
    fn parse_variable_definitions(&mut self) -> Vec<VariableDefinition> {
        let mut variables = Vec::new();
        if self.at_kind(TokenKind::LParen) {
            self.advance();
            while !self.at_kind(TokenKind::RParen) && !self.at_kind(TokenKind::Eof) {
                let start = self.current.span.start;
                if !self.expect(TokenKind::Dollar) {
                    break;
                }
                let name = self.expect_name("variable name");
                self.expect(TokenKind::Colon);
                let ty = self.parse_type();
                let default_value = if self.at_kind(TokenKind::Equals) {
                    self.advance();
                    self.parse_value(true)
                } else {
                    None
                };
                let directives = self.parse_directives();
                variables.push(VariableDefinition {
                    name,
                    ty,
                    default_value,
                    directives,
                    span: Span::new(start, self.last_end),
                });
            }
            self.expect(TokenKind::RParen);
        }
        variables
    }

    /// Parses `fragment Name on Type { ... }`.
    fn parse_fragment_definition(&mut self) -> Option<FragmentDefinition> {
        let start = self.current.span.start;
        self.advance(); // fragment
        let name = self.expect_name("fragment name");
        if name.value == "on" {
            self.diagnostics.error(
                codes::INVALID_SYNTAX,
                "fragment name must not be 'on'",
                name.span,
            );
        }
        if self.at_keyword("on") {
            self.advance();
        } else {
            self.error(codes::INVALID_SYNTAX, "expected 'on' in fragment definition");
        }
        let type_condition = self.expect_name("type condition");
        let directives = self.parse_directives();
        let selection_set = self.parse_selection_set()?;

        Some(FragmentDefinition {
            name,
            type_condition,
            directives,
            span: Span::new(start, selection_set.span.end),
            selection_set,
        })
    }

    /// Parses a `{ selections }` block.
    fn parse_selection_set(&mut self) -> Option<SelectionSet> {
        if self.depth >= MAX_DEPTH {
            self.error(codes::INVALID_SYNTAX, "selection set nesting is too deep");
            return None;
        }
        self.depth += 1;
        let result = self.parse_selection_set_inner();
        self.depth -= 1;
        result
    }

    fn parse_selection_set_inner(&mut self) -> Option<SelectionSet> {
        let start = self.current.span.start;
        if !self.expect(TokenKind::LBrace) {
            return None;
        }

        let mut selections = Vec::new();
        while !self.at_kind(TokenKind::RBrace) && !self.at_kind(TokenKind::Eof) {
            match self.parse_selection() {
                Some(selection) => selections.push(selection),
                None => self.advance(),
            }
        }
        self.expect(TokenKind::RBrace);

        if selections.is_empty() {
            self.diagnostics.error(
                codes::INVALID_SYNTAX,
                "selection set must not be empty",
                Span::new(start, self.last_end),
            );
        }

        Some(SelectionSet {
            selections,
            span: Span::new(start, self.last_end),
        })
    }

    /// Parses one selection: a field, fragment spread, or inline fragment.
    fn parse_selection(&mut self) -> Option<Selection> {
        if self.at_kind(TokenKind::Spread) {
            let start = self.current.span.start;
            self.advance();

            if self.at_kind(TokenKind::Name) && !self.at_keyword("on") {
                let name = self.expect_name("fragment name");
                let directives = self.parse_directives();
                return Some(Selection::FragmentSpread(FragmentSpread {
                    name,
                    directives,
                    span: Span::new(start, self.last_end),
                }));
            }

            let type_condition = if self.at_keyword("on") {
                self.advance();
                Some(self.expect_name("type condition"))
            } else {
                None
            };
            let directives = self.parse_directives();
            let selection_set = self.parse_selection_set()?;
            return Some(Selection::InlineFragment(InlineFragment {
                type_condition,
                directives,
                span: Span::new(start, selection_set.span.end),
                selection_set,
            }));
        }

        if !self.at_kind(TokenKind::Name) {
            let message = format!("expected a selection, found {}", self.at());
            self.error(codes::INVALID_SYNTAX, message);
            return None;
        }

        let start = self.current.span.start;
        let first = self.expect_name("field name");
        let (alias, name) = if self.at_kind(TokenKind::Colon) {
            self.advance();
            (Some(first), self.expect_name("field name"))
        } else {
            (None, first)
        };

        let arguments = self.parse_arguments();
        let directives = self.parse_directives();
        let selection_set = if self.at_kind(TokenKind::LBrace) {
            self.parse_selection_set()
        } else {
            None
        };

        Some(Selection::Field(FieldSelection {
            alias,
            name,
            arguments,
            directives,
            selection_set,
            span: Span::new(start, self.last_end),
        }))
    }

    /// Parses `(name: value, ...)`; empty when absent.
    fn parse_arguments(&mut self) -> Vec<Argument> {
        let mut arguments = Vec::new();
        if self.at_kind(TokenKind::LParen) {
            self.advance();
            while !self.at_kind(TokenKind::RParen) && !self.at_kind(TokenKind::Eof) {
                let start = self.current.span.start;
                let name = self.expect_name("argument name");
                if name.value.is_empty() {
                    break;
                }
                self.expect(TokenKind::Colon);
                let Some(value) = self.parse_value(false) else {
                    break;
                };
                arguments.push(Argument {
                    name,
                    value,
                    span: Span::new(start, self.last_end),
                });
            }
            self.expect(TokenKind::RParen);
        }
        arguments
    }

    /// Parses `@name(args)` directives.
    fn parse_directives(&mut self) -> Vec<Directive> {
        let mut directives = Vec::new();
        while self.at_kind(TokenKind::At) {
            let start = self.current.span.start;
            self.advance();
            let name = self.expect_name("directive name");
            let arguments = self.parse_arguments();
            directives.push(Directive {
                name,
                arguments,
                span: Span::new(start, self.last_end),
            });
        }
        directives
    }

    /// Parses a value literal. In const position, variables are rejected.
    fn parse_value(&mut self, const_only: bool) -> Option<Value> {
        if self.depth >= MAX_DEPTH {
            self.error(codes::INVALID_SYNTAX, "value nesting is too deep");
            return None;
        }
        let span = self.current.span;

        match self.at() {
            TokenKind::Dollar => {
                self.advance();
                let name = self.expect_name("variable name");
                if const_only {
                    self.diagnostics.error(
                        codes::INVALID_SYNTAX,
                        "variables are not allowed in this position",
                        name.span,
                    );
                }
                Some(Value::Variable(name))
            }
            TokenKind::IntLit => {
                let text = self.current_text();
                let parsed = text.parse::<i64>();
                self.advance();
                match parsed {
                    Ok(value) => Some(Value::Int(value, span)),
                    Err(_) => {
                        self.diagnostics.error(
                            codes::INVALID_SYNTAX,
                            format!("integer literal '{text}' is out of range"),
                            span,
                        );
                        None
                    }
                }
            }
            TokenKind::FloatLit => {
                let text = self.current_text();
                let parsed = text.parse::<f64>();
                self.advance();
                match parsed {
                    Ok(value) => Some(Value::Float(value, span)),
                    Err(_) => {
                        self.diagnostics.error(
                            codes::INVALID_SYNTAX,
                            format!("invalid float literal '{text}'"),
                            span,
                        );
                        None
                    }
                }
            }
            TokenKind::StringLit => {
                let raw = self.current_text();
                self.advance();
                match decode_string(raw) {
                    Ok(value) => Some(Value::String(value, span)),
                    Err(message) => {
                        self.diagnostics.error(codes::INVALID_SYNTAX, message, span);
                        None
                    }
                }
            }
            TokenKind::BlockStringLit => {
                let value = decode_block_string(self.current_text());
                self.advance();
                Some(Value::String(value, span))
            }
            TokenKind::Name => {
                let text = self.current_text();
                let value = match text {
                    "true" => Value::Boolean(true, span),
                    "false" => Value::Boolean(false, span),
                    "null" => Value::Null(span),
                    _ => Value::Enum(Name::new(text, span)),
                };
                self.advance();
                Some(value)
            }
            TokenKind::LBracket => {
                self.advance();
                self.depth += 1;
                let mut items = Vec::new();
                while !self.at_kind(TokenKind::RBracket) && !self.at_kind(TokenKind::Eof) {
                    match self.parse_value(const_only) {
                        Some(item) => items.push(item),
                        None => break,
                    }
                }
                self.depth -= 1;
                self.expect(TokenKind::RBracket);
                Some(Value::List(items, Span::new(span.start, self.last_end)))
            }
            TokenKind::LBrace => {
                self.advance();
                self.depth += 1;
                let mut fields = Vec::new();
                while !self.at_kind(TokenKind::RBrace) && !self.at_kind(TokenKind::Eof) {
                    let name = self.expect_name("input field name");
                    if name.value.is_empty() {
                        break;
                    }
                    self.expect(TokenKind::Colon);
                    match self.parse_value(const_only) {
                        Some(value) => fields.push((name, value)),
                        None => break,
                    }
                }
                self.depth -= 1;
                self.expect(TokenKind::RBrace);
                Some(Value::Object(fields, Span::new(span.start, self.last_end)))
            }
            _ => {
                let message = format!("expected a value, found {}", self.at());
                self.error(codes::INVALID_SYNTAX, message);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Document {
        let result = parse(source);
        assert!(
            !result.diagnostics.has_errors(),
            "unexpected parse errors: {:?}",
            result.diagnostics.errors().collect::<Vec<_>>()
        );
        result.document
    }

    #[test]
    fn test_parse_object_type() {
        let doc = parse_ok("type Dog { name: String legs: Int! }");
        assert_eq!(doc.definitions.len(), 1);
        let Definition::Type(TypeDefinition::Object(object)) = &doc.definitions[0] else {
            panic!("expected object type");
        };
        assert_eq!(object.name.value, "Dog");
        assert_eq!(object.fields.len(), 2);
        assert_eq!(object.fields[0].name.value, "name");
        assert!(object.fields[1].ty.is_non_null());
    }

    #[test]
    fn test_parse_implements_and_lists() {
        let doc = parse_ok("type Dog implements Pet & Named { friends: [Dog!]! }");
        let Definition::Type(TypeDefinition::Object(object)) = &doc.definitions[0] else {
            panic!("expected object type");
        };
        assert_eq!(object.implements.len(), 2);
        let field = &object.fields[0];
        assert_eq!(field.ty.to_string(), "[Dog!]!");
        assert_eq!(field.ty.base().name, "Dog");
    }

    #[test]
    fn test_parse_schema_and_scalar_and_union() {
        let doc = parse_ok(
            "schema { query: Query mutation: Mutation }\n\
             scalar Date\n\
             union Pet = Dog | Cat",
        );
        assert_eq!(doc.definitions.len(), 3);
        let Definition::Schema(schema) = &doc.definitions[0] else {
            panic!("expected schema definition");
        };
        assert_eq!(schema.operations.len(), 2);
        let Definition::Type(TypeDefinition::Union(union)) = &doc.definitions[2] else {
            panic!("expected union");
        };
        assert_eq!(union.members.len(), 2);
    }

    #[test]
    fn test_parse_query_shorthand() {
        let doc = parse_ok("{ dog { name } }");
        let Definition::Operation(op) = &doc.definitions[0] else {
            panic!("expected operation");
        };
        assert_eq!(op.operation, OperationType::Query);
        assert!(op.name.is_none());
        assert_eq!(op.selection_set.selections.len(), 1);
    }

    #[test]
    fn test_parse_operation_with_variables() {
        let doc = parse_ok("query Fetch($x: Int = 3, $name: String!) { f(n: $x) }");
        let Definition::Operation(op) = &doc.definitions[0] else {
            panic!("expected operation");
        };
        assert_eq!(op.name.as_ref().unwrap().value, "Fetch");
        assert_eq!(op.variables.len(), 2);
        assert!(matches!(op.variables[0].default_value, Some(Value::Int(3, _))));
        assert!(op.variables[1].ty.is_non_null());
    }

    #[test]
    fn test_parse_fragments() {
        let doc = parse_ok(
            "query { dog { ...dogFields ... on Dog { name } } }\n\
             fragment dogFields on Dog { name }",
        );
        let Definition::Operation(op) = &doc.definitions[0] else {
            panic!("expected operation");
        };
        let Selection::Field(dog) = &op.selection_set.selections[0] else {
            panic!("expected field");
        };
        let selections = &dog.selection_set.as_ref().unwrap().selections;
        assert!(matches!(selections[0], Selection::FragmentSpread(_)));
        assert!(matches!(selections[1], Selection::InlineFragment(_)));
        assert_eq!(doc.fragments().count(), 1);
    }

    #[test]
    fn test_parse_alias_and_directives() {
        let doc = parse_ok("{ big: dog @include(if: true) { name } }");
        let Definition::Operation(op) = &doc.definitions[0] else {
            panic!("expected operation");
        };
        let Selection::Field(field) = &op.selection_set.selections[0] else {
            panic!("expected field");
        };
        assert_eq!(field.response_key(), "big");
        assert_eq!(field.name.value, "dog");
        assert_eq!(field.directives[0].name.value, "include");
    }

    #[test]
    fn test_parse_values() {
        let doc = parse_ok(r#"{ f(a: 1, b: 2.5, c: "hi", d: true, e: null, g: RED, h: [1, 2], i: {x: 1}) }"#);
        let Definition::Operation(op) = &doc.definitions[0] else {
            panic!("expected operation");
        };
        let Selection::Field(field) = &op.selection_set.selections[0] else {
            panic!("expected field");
        };
        assert_eq!(field.arguments.len(), 8);
        assert!(matches!(field.arguments[5].value, Value::Enum(_)));
        assert!(matches!(field.arguments[6].value, Value::List(..)));
    }

    #[test]
    fn test_parse_error_recovers() {
        let result = parse("type { name: String } type Dog { name: String }");
        assert!(result.diagnostics.has_errors());
        // The well-formed definition after the bad one is still parsed.
        assert!(result
            .document
            .definitions
            .iter()
            .any(|def| matches!(def, Definition::Type(t) if t.name().value == "Dog")));
    }

    #[test]
    fn test_syntax_error_reports_not_panics() {
        let result = parse("{ dog { name }");
        assert!(result.diagnostics.has_errors());
    }

    #[test]
    fn test_directive_definition() {
        let doc = parse_ok("directive @include(if: Boolean!) on FIELD | FRAGMENT_SPREAD");
        let Definition::Directive(directive) = &doc.definitions[0] else {
            panic!("expected directive definition");
        };
        assert_eq!(directive.name.value, "include");
        assert_eq!(directive.arguments.len(), 1);
        assert_eq!(directive.locations.len(), 2);
    }

    #[test]
    fn test_descriptions() {
        let doc = parse_ok("\"A dog\" type Dog { \"its name\" name: String }");
        let Definition::Type(TypeDefinition::Object(object)) = &doc.definitions[0] else {
            panic!("expected object type");
        };
        assert_eq!(object.description.as_ref().unwrap().value, "A dog");
        assert_eq!(
            object.fields[0].description.as_ref().unwrap().value,
            "its name"
        );
    }
}

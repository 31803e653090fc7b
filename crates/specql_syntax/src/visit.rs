//! Composable traversal over executable documents.
//!
//! The walker drives [`Visitor`] implementations over every node of the
//! operations and fragments in a document, in source order. Hooks receive the
//! node and the path of ancestor nodes from the document root down to the
//! node's parent. Several visitors can be composed with [`VisitorList`];
//! composition preserves the declared order for every hook.

use crate::ast::*;

/// A reference to any executable AST node, used for ancestor paths.
#[derive(Clone, Copy)]
pub enum Node<'a> {
    Document(&'a Document),
    Operation(&'a OperationDefinition),
    VariableDefinition(&'a VariableDefinition),
    Fragment(&'a FragmentDefinition),
    SelectionSet(&'a SelectionSet),
    Field(&'a FieldSelection),
    FragmentSpread(&'a FragmentSpread),
    InlineFragment(&'a InlineFragment),
    Argument(&'a Argument),
    Directive(&'a Directive),
    Value(&'a Value),
}

/// Visitor hooks. All hooks have empty default implementations; implement the
/// ones the pass cares about.
#[allow(unused_variables)]
pub trait Visitor {
    fn enter_document(&mut self, doc: &Document) {}
    fn leave_document(&mut self, doc: &Document) {}

    fn enter_operation(&mut self, op: &OperationDefinition, path: &[Node<'_>]) {}
    fn leave_operation(&mut self, op: &OperationDefinition, path: &[Node<'_>]) {}

    fn enter_variable_definition(&mut self, var: &VariableDefinition, path: &[Node<'_>]) {}

    fn enter_fragment(&mut self, fragment: &FragmentDefinition, path: &[Node<'_>]) {}
    fn leave_fragment(&mut self, fragment: &FragmentDefinition, path: &[Node<'_>]) {}

    fn enter_selection_set(&mut self, set: &SelectionSet, path: &[Node<'_>]) {}
    fn leave_selection_set(&mut self, set: &SelectionSet, path: &[Node<'_>]) {}

    fn enter_field(&mut self, field: &FieldSelection, path: &[Node<'_>]) {}
    fn leave_field(&mut self, field: &FieldSelection, path: &[Node<'_>]) {}

    fn enter_fragment_spread(&mut self, spread: &FragmentSpread, path: &[Node<'_>]) {}

    fn enter_inline_fragment(&mut self, fragment: &InlineFragment, path: &[Node<'_>]) {}
    fn leave_inline_fragment(&mut self, fragment: &InlineFragment, path: &[Node<'_>]) {}

    fn enter_argument(&mut self, argument: &Argument, path: &[Node<'_>]) {}
    fn leave_argument(&mut self, argument: &Argument, path: &[Node<'_>]) {}

    fn enter_directive(&mut self, directive: &Directive, path: &[Node<'_>]) {}
    fn leave_directive(&mut self, directive: &Directive, path: &[Node<'_>]) {}

    fn enter_value(&mut self, value: &Value, path: &[Node<'_>]) {}
}

/// A list of visitors driven as one; hooks fan out in declared order.
pub struct VisitorList<'v> {
    visitors: Vec<&'v mut dyn Visitor>,
}

impl<'v> VisitorList<'v> {
    /// Creates a visitor list from the given visitors.
    pub fn new(visitors: Vec<&'v mut dyn Visitor>) -> Self {
        Self { visitors }
    }
}

macro_rules! fan_out {
    ($self:ident, $hook:ident, $($arg:expr),*) => {
        for visitor in $self.visitors.iter_mut() {
            visitor.$hook($($arg),*);
        }
    };
}

impl Visitor for VisitorList<'_> {
    fn enter_document(&mut self, doc: &Document) {
        fan_out!(self, enter_document, doc);
    }
    fn leave_document(&mut self, doc: &Document) {
        fan_out!(self, leave_document, doc);
    }
    fn enter_operation(&mut self, op: &OperationDefinition, path: &[Node<'_>]) {
        fan_out!(self, enter_operation, op, path);
    }
    fn leave_operation(&mut self, op: &OperationDefinition, path: &[Node<'_>]) {
        fan_out!(self, leave_operation, op, path);
    }
    fn enter_variable_definition(&mut self, var: &VariableDefinition, path: &[Node<'_>]) {
        fan_out!(self, enter_variable_definition, var, path);
    }
    fn enter_fragment(&mut self, fragment: &FragmentDefinition, path: &[Node<'_>]) {
        fan_out!(self, enter_fragment, fragment, path);
    }
    fn leave_fragment(&mut self, fragment: &FragmentDefinition, path: &[Node<'_>]) {
        fan_out!(self, leave_fragment, fragment, path);
    }
    fn enter_selection_set(&mut self, set: &SelectionSet, path: &[Node<'_>]) {
        fan_out!(self, enter_selection_set, set, path);
    }
    fn leave_selection_set(&mut self, set: &SelectionSet, path: &[Node<'_>]) {
        fan_out!(self, leave_selection_set, set, path);
    }
    fn enter_field(&mut self, field: &FieldSelection, path: &[Node<'_>]) {
        fan_out!(self, enter_field, field, path);
    }
    fn leave_field(&mut self, field: &FieldSelection, path: &[Node<'_>]) {
        fan_out!(self, leave_field, field, path);
    }
    fn enter_fragment_spread(&mut self, spread: &FragmentSpread, path: &[Node<'_>]) {
        fan_out!(self, enter_fragment_spread, spread, path);
    }
    fn enter_inline_fragment(&mut self, fragment: &InlineFragment, path: &[Node<'_>]) {
        fan_out!(self, enter_inline_fragment, fragment, path);
    }
    fn leave_inline_fragment(&mut self, fragment: &InlineFragment, path: &[Node<'_>]) {
        fan_out!(self, leave_inline_fragment, fragment, path);
    }
    fn enter_argument(&mut self, argument: &Argument, path: &[Node<'_>]) {
        fan_out!(self, enter_argument, argument, path);
    }
    fn leave_argument(&mut self, argument: &Argument, path: &[Node<'_>]) {
        fan_out!(self, leave_argument, argument, path);
    }
    fn enter_directive(&mut self, directive: &Directive, path: &[Node<'_>]) {
        fan_out!(self, enter_directive, directive, path);
    }
    fn leave_directive(&mut self, directive: &Directive, path: &[Node<'_>]) {
        fan_out!(self, leave_directive, directive, path);
    }
    fn enter_value(&mut self, value: &Value, path: &[Node<'_>]) {
        fan_out!(self, enter_value, value, path);
    }
}

/// Walks the executable definitions of a document with the given visitor.
pub fn walk_document(visitor: &mut dyn Visitor, doc: &Document) {
    let mut path: Vec<Node<'_>> = Vec::new();
    visitor.enter_document(doc);
    path.push(Node::Document(doc));

    for definition in &doc.definitions {
        match definition {
            Definition::Operation(op) => walk_operation(visitor, op, &mut path),
            Definition::Fragment(fragment) => walk_fragment(visitor, fragment, &mut path),
            _ => {}
        }
    }

    path.pop();
    visitor.leave_document(doc);
}

fn walk_operation<'a>(
    visitor: &mut dyn Visitor,
    op: &'a OperationDefinition,
    path: &mut Vec<Node<'a>>,
) {
    visitor.enter_operation(op, path);
    path.push(Node::Operation(op));

    for variable in &op.variables {
        visitor.enter_variable_definition(variable, path);
        path.push(Node::VariableDefinition(variable));
        if let Some(default) = &variable.default_value {
            walk_value(visitor, default, path);
        }
        walk_directives(visitor, &variable.directives, path);
        path.pop();
    }
    walk_directives(visitor, &op.directives, path);
    walk_selection_set(visitor, &op.selection_set, path);

    path.pop();
    visitor.leave_operation(op, path);
}

fn walk_fragment<'a>(
    visitor: &mut dyn Visitor,
    fragment: &'a FragmentDefinition,
    path: &mut Vec<Node<'a>>,
) {
    visitor.enter_fragment(fragment, path);
    path.push(Node::Fragment(fragment));

    walk_directives(visitor, &fragment.directives, path);
    walk_selection_set(visitor, &fragment.selection_set, path);

    path.pop();
    visitor.leave_fragment(fragment, path);
}

fn walk_selection_set<'a>(
    visitor: &mut dyn Visitor,
    set: &'a SelectionSet,
    path: &mut Vec<Node<'a>>,
) {
    visitor.enter_selection_set(set, path);
    path.push(Node::SelectionSet(set));

    for selection in &set.selections {
        match selection {
            Selection::Field(field) => {
                visitor.enter_field(field, path);
                path.push(Node::Field(field));
                for argument in &field.arguments {
                    walk_argument(visitor, argument, path);
                }
                walk_directives(visitor, &field.directives, path);
                if let Some(sub) = &field.selection_set {
                    walk_selection_set(visitor, sub, path);
                }
                path.pop();
                visitor.leave_field(field, path);
            }
            Selection::FragmentSpread(spread) => {
                visitor.enter_fragment_spread(spread, path);
                path.push(Node::FragmentSpread(spread));
                walk_directives(visitor, &spread.directives, path);
                path.pop();
            }
            Selection::InlineFragment(inline) => {
                visitor.enter_inline_fragment(inline, path);
                path.push(Node::InlineFragment(inline));
                walk_directives(visitor, &inline.directives, path);
                walk_selection_set(visitor, &inline.selection_set, path);
                path.pop();
                visitor.leave_inline_fragment(inline, path);
            }
        }
    }

    path.pop();
    visitor.leave_selection_set(set, path);
}

fn walk_argument<'a>(visitor: &mut dyn Visitor, argument: &'a Argument, path: &mut Vec<Node<'a>>) {
    visitor.enter_argument(argument, path);
    path.push(Node::Argument(argument));
    walk_value(visitor, &argument.value, path);
    path.pop();
    visitor.leave_argument(argument, path);
}

fn walk_directives<'a>(
    visitor: &mut dyn Visitor,
    directives: &'a [Directive],
    path: &mut Vec<Node<'a>>,
) {
    for directive in directives {
        visitor.enter_directive(directive, path);
        path.push(Node::Directive(directive));
        for argument in &directive.arguments {
            walk_argument(visitor, argument, path);
        }
        path.pop();
        visitor.leave_directive(directive, path);
    }
}

fn walk_value<'a>(visitor: &mut dyn Visitor, value: &'a Value, path: &mut Vec<Node<'a>>) {
    visitor.enter_value(value, path);
    match value {
        Value::List(items, _) => {
            path.push(Node::Value(value));
            for item in items {
                walk_value(visitor, item, path);
            }
            path.pop();
        }
        Value::Object(fields, _) => {
            path.push(Node::Value(value));
            for (_, field_value) in fields {
                walk_value(visitor, field_value, path);
            }
            path.pop();
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl Visitor for Recorder {
        fn enter_field(&mut self, field: &FieldSelection, path: &[Node<'_>]) {
            self.events
                .push(format!("field:{}@{}", field.name.value, path.len()));
        }
        fn enter_argument(&mut self, argument: &Argument, _path: &[Node<'_>]) {
            self.events.push(format!("arg:{}", argument.name.value));
        }
        fn enter_fragment_spread(&mut self, spread: &FragmentSpread, _path: &[Node<'_>]) {
            self.events.push(format!("spread:{}", spread.name.value));
        }
    }

    #[test]
    fn test_walk_order_is_source_order() {
        let result = parse("{ a(x: 1) b { c ...frag } }");
        let mut recorder = Recorder::default();
        walk_document(&mut recorder, &result.document);
        assert_eq!(
            recorder.events,
            vec!["field:a@3", "arg:x", "field:b@3", "field:c@5", "spread:frag"]
        );
    }

    #[test]
    fn test_composition_preserves_order() {
        struct Tag(&'static str, std::rc::Rc<std::cell::RefCell<Vec<&'static str>>>);
        impl Visitor for Tag {
            fn enter_field(&mut self, _field: &FieldSelection, _path: &[Node<'_>]) {
                self.1.borrow_mut().push(self.0);
            }
        }

        let log = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut first = Tag("first", log.clone());
        let mut second = Tag("second", log.clone());
        let result = parse("{ a }");
        let mut list = VisitorList::new(vec![&mut first, &mut second]);
        walk_document(&mut list, &result.document);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }
}

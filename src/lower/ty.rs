//! Lowers type syntax (`parser::ty`'s `TypeRef`/`PointerType`/`ArrayType`/`ProcType`/`TypeTag`
//! nodes) into [`TypeKind`] elements.
//!
//! Type names resolve eagerly here, unlike identifier references (deferred to the semantic
//! engine's symbol-resolution pass, spec §4.7 pass 2): a struct's own name must already be in its
//! enclosing scope's type table before its fields are lowered, so `Node :: struct { next: ^Node }`
//! can find `Node` while lowering `next`'s declared type. Composite/enum lowering follows that
//! forward-registration shape: register a placeholder first, lower members against it in scope,
//! then patch the placeholder's `members` in place.

use super::Lowerer;
use crate::ast::{NodeId, NodeKind};
use crate::diagnostics::DiagnosticCode;
use crate::element::{BindingKind, CompositeKind, CompositeType, ElementId, ElementKind, ProcedureType, TypeKind};
use crate::scope::{BlockId, Symbol};
use crate::source::Span;
use crate::token::TokenKind;

impl<'a> Lowerer<'a> {
    /// Lowers a type node to its [`TypeKind`] element. `name_hint`, when present, is the name the
    /// enclosing declaration is binding this type to (used to self-register composites under
    /// their own name before their members are lowered).
    pub(super) fn lower_type(&mut self, node: NodeId, scope: BlockId, name_hint: Option<&str>) -> ElementId {
        let n = self.ast.get(node).clone();
        match n.kind {
            NodeKind::PointerType => {
                let base = self.lower_type(n.lhs.unwrap(), scope, None);
                if let Some(existing) = self.scopes.find_pointer_type(base) {
                    return existing;
                }
                let ptr = self.builder.make(ElementKind::Type(TypeKind::Pointer { base }), n.span);
                self.scopes.register_pointer_type(base, ptr);
                ptr
            }
            NodeKind::ArrayType => match n.rhs {
                Some(elem_node) => {
                    let len = Some(self.lower_expr(n.lhs.unwrap(), scope));
                    let elem = self.lower_type(elem_node, scope, None);
                    self.builder.make(ElementKind::Type(TypeKind::Array { len, elem }), n.span)
                }
                None => {
                    let elem = self.lower_type(n.lhs.unwrap(), scope, None);
                    self.builder.make(ElementKind::Type(TypeKind::Array { len: None, elem }), n.span)
                }
            },
            NodeKind::ProcType => self.lower_proc_type(node, scope, name_hint),
            NodeKind::TypeTag => {
                let base_name = self.ident_name(n.children[0]);
                for &arg in &n.children[1..] {
                    // Type arguments are lowered for their side effects (registering nested
                    // composites/pointers) but this spec's type system has no generic
                    // instantiation step of its own to feed them into.
                    self.lower_type(arg, scope, None);
                }
                self.resolve_named_type(&base_name, scope, n.span)
            }
            NodeKind::TypeRef => self.lower_type_ref(node, scope, name_hint),
            _ => {
                self.report(DiagnosticCode::P019UnexpectedToken, n.span);
                self.builder.make(ElementKind::Type(TypeKind::Unknown), n.span)
            }
        }
    }

    /// As [`Self::lower_type`], but for a node that may be either a type or a value (spec §3's
    /// type constructors double as expressions): `#type`/decl initializers reach here since the
    /// grammar doesn't tell the two apart until lowering sees the node kind.
    pub(super) fn lower_value_or_type(&mut self, node: NodeId, scope: BlockId, name_hint: Option<&str>) -> ElementId {
        let kind = self.ast.get(node).kind;
        match kind {
            NodeKind::TypeRef | NodeKind::PointerType | NodeKind::ArrayType | NodeKind::ProcType | NodeKind::TypeTag => {
                self.lower_type(node, scope, name_hint)
            }
            _ => self.lower_expr(node, scope),
        }
    }

    fn lower_type_ref(&mut self, node: NodeId, scope: BlockId, name_hint: Option<&str>) -> ElementId {
        let n = self.ast.get(node).clone();
        if let Some(tok) = n.binding {
            match self.pool.get(tok).kind {
                TokenKind::KwStruct => return self.lower_composite(node, scope, name_hint, CompositeKind::Struct),
                TokenKind::KwUnion => return self.lower_composite(node, scope, name_hint, CompositeKind::Union),
                TokenKind::KwEnum => return self.lower_enum(node, scope, name_hint),
                _ => {}
            }
        }
        if !n.children.is_empty() {
            let segments: Vec<String> = n.children.iter().map(|&seg| self.ident_name(seg)).collect();
            return self.resolve_qualified_type(&segments, scope, n.span);
        }
        let name = self.ident_name(node);
        self.resolve_named_type(&name, scope, n.span)
    }

    fn lower_composite(
        &mut self,
        node: NodeId,
        scope: BlockId,
        name_hint: Option<&str>,
        composite_kind: CompositeKind,
    ) -> ElementId {
        let n = self.ast.get(node).clone();
        let symbol = Symbol::plain(name_hint.unwrap_or_default());
        let placeholder = self.builder.make(
            ElementKind::Type(TypeKind::Composite(CompositeType { kind: composite_kind, symbol, members: Vec::new() })),
            n.span,
        );
        if let Some(name) = name_hint {
            if self.scopes.add_type_to_scope(scope, name, placeholder).is_err() {
                self.report(DiagnosticCode::R033DuplicateTypeName, n.span);
            }
        }
        let field_nodes = n.children.clone();
        let members: Vec<ElementId> = field_nodes.iter().map(|&f| self.lower_struct_field(f, scope)).collect();
        if let ElementKind::Type(TypeKind::Composite(c)) = &mut self.builder.graph_mut().get_mut(placeholder).kind {
            c.members = members;
        }
        placeholder
    }

    fn lower_struct_field(&mut self, node: NodeId, scope: BlockId) -> ElementId {
        let n = self.ast.get(node).clone();
        let name = self.ident_name(n.lhs.unwrap());
        let ty = self.lower_type(n.rhs.unwrap(), scope, None);
        self.builder.make(ElementKind::Binding(BindingKind::Field { name, declared_type: ty, default: None }), n.span)
    }

    fn lower_enum(&mut self, node: NodeId, scope: BlockId, name_hint: Option<&str>) -> ElementId {
        let n = self.ast.get(node).clone();
        let symbol = Symbol::plain(name_hint.unwrap_or_default());
        let placeholder = self.builder.make(
            ElementKind::Type(TypeKind::Composite(CompositeType { kind: CompositeKind::Enum, symbol, members: Vec::new() })),
            n.span,
        );
        if let Some(name) = name_hint {
            if self.scopes.add_type_to_scope(scope, name, placeholder).is_err() {
                self.report(DiagnosticCode::R033DuplicateTypeName, n.span);
            }
        }
        let member_nodes = n.children.clone();
        let members: Vec<ElementId> = member_nodes.iter().map(|&m| self.lower_enum_member(m, scope)).collect();
        if let ElementKind::Type(TypeKind::Composite(c)) = &mut self.builder.graph_mut().get_mut(placeholder).kind {
            c.members = members;
        }
        placeholder
    }

    fn lower_enum_member(&mut self, node: NodeId, scope: BlockId) -> ElementId {
        let n = self.ast.get(node).clone();
        let (name_node, init_node) = if n.kind == NodeKind::Decl { (n.lhs.unwrap(), n.rhs) } else { (node, None) };
        let name = self.ident_name(name_node);
        let init = init_node.map(|v| self.lower_expr(v, scope));
        let symbol = Symbol::plain(name.clone());
        self.builder.make(
            ElementKind::Binding(BindingKind::Identifier { name, symbol, declared_type: None, init, constant: true }),
            n.span,
        )
    }

    fn lower_proc_type(&mut self, node: NodeId, scope: BlockId, name_hint: Option<&str>) -> ElementId {
        let n = self.ast.get(node).clone();
        let children = n.children.clone();
        let param_list_node = children[0];
        let mut ret_node = None;
        let mut body_node = None;
        if let Some(&second) = children.get(1) {
            if self.ast.get(second).kind == NodeKind::Block {
                body_node = Some(second);
            } else {
                ret_node = Some(second);
                body_node = children.get(2).copied();
            }
        }

        let param_nodes = self.ast.get(param_list_node).children.clone();
        let mut params = Vec::with_capacity(param_nodes.len());
        for &p in &param_nodes {
            let pn = self.ast.get(p).clone();
            if pn.kind == NodeKind::Decl {
                let param_node = self.ast.get(pn.lhs.unwrap()).clone();
                let name = self.ident_name(param_node.lhs.unwrap());
                let ty = self.lower_type(param_node.rhs.unwrap(), scope, None);
                let default = Some(self.lower_expr(pn.rhs.unwrap(), scope));
                params.push(self.builder.make(ElementKind::Binding(BindingKind::Field { name, declared_type: ty, default }), pn.span));
            } else {
                let name = self.ident_name(pn.lhs.unwrap());
                let ty = self.lower_type(pn.rhs.unwrap(), scope, None);
                params.push(self.builder.make(ElementKind::Binding(BindingKind::Field { name, declared_type: ty, default: None }), pn.span));
            }
        }

        let returns = match ret_node {
            Some(r) => vec![self.lower_type(r, scope, None)],
            None => Vec::new(),
        };

        let body = body_node.map(|b| self.lower_proc_body(b, scope, &params));

        let ty = ProcedureType {
            symbol: name_hint.map(|s| Symbol::plain(s.to_string())),
            params,
            returns,
            body,
            foreign: None,
            intrinsic_name: None,
        };
        self.builder.make(ElementKind::Type(TypeKind::Procedure(ty)), n.span)
    }

    /// Pushes a fresh scope for the procedure body, declares each parameter as an identifier in
    /// it, lowers the body's statements into it, and returns the resulting [`BlockId`].
    fn lower_proc_body(&mut self, block_node: NodeId, _outer_scope: BlockId, params: &[ElementId]) -> BlockId {
        let body_scope = self.scopes.push_scope();
        let prev_scope = self.builder.set_scope(Some(body_scope));
        for &param_id in params {
            let (name, declared_type) = match &self.builder.graph().get(param_id).kind {
                ElementKind::Binding(BindingKind::Field { name, declared_type, .. }) => (name.clone(), *declared_type),
                _ => continue,
            };
            let symbol = Symbol::plain(name.clone());
            let identifier = self.builder.make(
                ElementKind::Binding(BindingKind::Identifier {
                    name: name.clone(),
                    symbol,
                    declared_type: Some(declared_type),
                    init: None,
                    constant: false,
                }),
                self.span(block_node),
            );
            let _ = self.scopes.declare_identifier(body_scope, &name, identifier);
        }
        let stmts = self.ast.get(block_node).children.clone();
        self.lower_stmt_sequence(&stmts, body_scope);
        self.builder.set_scope(prev_scope);
        self.scopes.pop_scope();
        body_scope
    }

    fn resolve_named_type(&mut self, name: &str, scope: BlockId, span: Span) -> ElementId {
        if let Some(ty) = self.scopes.find_type(scope, name) {
            return ty;
        }
        self.report(DiagnosticCode::R030UndefinedIdentifier, span);
        self.builder.make(ElementKind::Type(TypeKind::Unknown), span)
    }

    fn resolve_qualified_type(&mut self, segments: &[String], scope: BlockId, span: Span) -> ElementId {
        let mut current_scope = scope;
        let mut result = None;
        for (i, seg) in segments.iter().enumerate() {
            let Some(ty) = self.scopes.find_type(current_scope, seg) else {
                self.report(DiagnosticCode::R030UndefinedIdentifier, span);
                return self.builder.make(ElementKind::Type(TypeKind::Unknown), span);
            };
            result = Some(ty);
            if i + 1 < segments.len() {
                current_scope = match &self.builder.graph().get(ty).kind {
                    ElementKind::ModuleLevel(crate::element::ModuleKind::Namespace { body, .. }) => *body,
                    ElementKind::ModuleLevel(crate::element::ModuleKind::Module { body, .. }) => *body,
                    _ => current_scope,
                };
            }
        }
        result.unwrap()
    }
}

//! Named set resolution.
//!
//! `LIST` definitions are closed the moment they are parsed; `SET`
//! definitions are algebra expressions over other sets and are resolved here,
//! after the whole grammar has been read, so a `SET` may reference a set
//! defined later in the file. Resolution is demand-driven with memoization:
//! each name is computed once, operands strictly left-to-right, and a
//! visiting stack turns mutual recursion into a `CyclicSetError` naming the
//! cycle instead of a stack overflow.

use std::collections::HashMap;

use crate::errors::CompileError;
use crate::tags::TagSet;

/// An operand of a `SET` expression, as parsed.
#[derive(Debug, Clone)]
pub enum SetOperand {
    /// Reference to a named `LIST`/`SET`.
    Named { name: String, line: usize },
    /// Inline parenthesized or quoted tags.
    Inline(TagSet),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    Union,
    Difference,
    Combine,
}

/// Right-hand side of a `SET` statement: `first op operand op operand …`.
#[derive(Debug, Clone)]
pub struct SetExpr {
    pub first: SetOperand,
    pub rest: Vec<(SetOp, SetOperand)>,
}

/// One named definition, in declaration order.
#[derive(Debug, Clone)]
pub enum SetDef {
    /// `LIST name = …;` — already closed.
    List(TagSet),
    /// `SET name = …;` — resolved lazily.
    Expr(SetExpr),
}

/// Resolve every named set to a closed [`TagSet`].
pub fn resolve_all(defs: &[(String, SetDef)]) -> Result<HashMap<String, TagSet>, CompileError> {
    let index: HashMap<&str, usize> = defs.iter().enumerate().map(|(i, (name, _))| (name.as_str(), i)).collect();
    let mut resolver = Resolver { defs, index, resolved: vec![None; defs.len()], visiting: Vec::new() };

    // Definition order, so diagnostics are reproducible.
    for i in 0..defs.len() {
        resolver.resolve_index(i)?;
    }

    Ok(defs
        .iter()
        .zip(resolver.resolved)
        .map(|((name, _), set)| (name.clone(), set.expect("resolved above")))
        .collect())
}

/// Resolve one operand against an already-resolved set table. Used for the
/// set references inside rules, after `resolve_all` has run.
pub fn resolve_operand(operand: &SetOperand, sets: &HashMap<String, TagSet>) -> Result<TagSet, CompileError> {
    match operand {
        SetOperand::Inline(set) => Ok(set.clone()),
        SetOperand::Named { name, line } => sets
            .get(name)
            .cloned()
            .ok_or_else(|| CompileError::UndefinedSet { name: name.clone(), line: *line }),
    }
}

struct Resolver<'a> {
    defs: &'a [(String, SetDef)],
    index: HashMap<&'a str, usize>,
    resolved: Vec<Option<TagSet>>,
    visiting: Vec<usize>,
}

impl Resolver<'_> {
    fn resolve_index(&mut self, i: usize) -> Result<TagSet, CompileError> {
        if let Some(set) = &self.resolved[i] {
            return Ok(set.clone());
        }
        if let Some(pos) = self.visiting.iter().position(|&v| v == i) {
            let mut cycle: Vec<String> =
                self.visiting[pos..].iter().map(|&v| self.defs[v].0.clone()).collect();
            cycle.push(self.defs[i].0.clone());
            return Err(CompileError::CyclicSet { cycle });
        }

        self.visiting.push(i);
        let defs = self.defs;
        let result = match &defs[i].1 {
            SetDef::List(set) => Ok(set.clone()),
            SetDef::Expr(expr) => self.eval(expr),
        };
        self.visiting.pop();

        let set = result?;
        self.resolved[i] = Some(set.clone());
        Ok(set)
    }

    fn eval(&mut self, expr: &SetExpr) -> Result<TagSet, CompileError> {
        let mut acc = self.operand(&expr.first)?;
        for (op, operand) in &expr.rest {
            let rhs = self.operand(operand)?;
            acc = match op {
                SetOp::Union => acc.union(&rhs),
                SetOp::Difference => acc.difference(&rhs),
                SetOp::Combine => acc.combine(&rhs),
            };
        }
        Ok(acc)
    }

    fn operand(&mut self, operand: &SetOperand) -> Result<TagSet, CompileError> {
        match operand {
            SetOperand::Inline(set) => Ok(set.clone()),
            SetOperand::Named { name, line } => match self.index.get(name.as_str()) {
                Some(&i) => self.resolve_index(i),
                None => Err(CompileError::UndefinedSet { name: name.clone(), line: *line }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::Interner;
    use crate::tags::{CompositeTag, Tag};

    fn list(interner: &Interner, tags: &[&str]) -> SetDef {
        let alts = tags.iter().map(|t| CompositeTag::single(Tag::parse(t, interner).unwrap())).collect();
        SetDef::List(TagSet::new(alts))
    }

    fn named(name: &str) -> SetOperand {
        SetOperand::Named { name: name.to_string(), line: 1 }
    }

    #[test]
    fn forward_references_resolve() {
        let interner = Interner::new();
        let defs = vec![
            ("X".to_string(), SetDef::Expr(SetExpr { first: named("N"), rest: vec![(SetOp::Union, named("V"))] })),
            ("N".to_string(), list(&interner, &["n"])),
            ("V".to_string(), list(&interner, &["v"])),
        ];
        let sets = resolve_all(&defs).unwrap();
        assert_eq!(sets["X"].alts().len(), 2);
    }

    #[test]
    fn undefined_set_is_reported() {
        let defs =
            vec![("X".to_string(), SetDef::Expr(SetExpr { first: named("Missing"), rest: Vec::new() }))];
        match resolve_all(&defs) {
            Err(CompileError::UndefinedSet { name, .. }) => assert_eq!(name, "Missing"),
            other => panic!("expected undefined set, got {other:?}"),
        }
    }

    #[test]
    fn cycle_is_reported_with_path() {
        let defs = vec![
            ("A".to_string(), SetDef::Expr(SetExpr { first: named("B"), rest: Vec::new() })),
            ("B".to_string(), SetDef::Expr(SetExpr { first: named("A"), rest: Vec::new() })),
        ];
        match resolve_all(&defs) {
            Err(CompileError::CyclicSet { cycle }) => assert_eq!(cycle, vec!["A", "B", "A"]),
            other => panic!("expected cyclic set, got {other:?}"),
        }
    }

    #[test]
    fn difference_and_combine_evaluate_left_to_right() {
        let interner = Interner::new();
        let defs = vec![
            ("NV".to_string(), list(&interner, &["n", "v"])),
            ("V".to_string(), list(&interner, &["v"])),
            (
                "OnlyN".to_string(),
                SetDef::Expr(SetExpr { first: named("NV"), rest: vec![(SetOp::Difference, named("V"))] }),
            ),
        ];
        let sets = resolve_all(&defs).unwrap();
        assert_eq!(sets["OnlyN"].alts().len(), 1);
        assert_eq!(sets["OnlyN"].alts()[0].members()[0].text(&interner), "n");
    }
}

//! Grammar statement parser.
//!
//! Turns the token stream into a [`RuleSet`] in two phases:
//!
//! 1. **Collect**: walk the statements, building named set definitions,
//!    section headers, and *raw* rules whose set references are still names.
//! 2. **Resolve**: evaluate the set algebra (`sets.rs`), then substitute
//!    every set reference inside rules with its closed [`TagSet`].
//!
//! The split exists because a `SET` may reference a set defined later in the
//! file; rules resolve only after the full set table is known. After
//! compilation nothing in the rule set refers to anything by name.
//!
//! Statement shapes accepted:
//!
//! ```text
//! DELIMITERS = "<$.>" "<$!>" "<$?>" ;
//! MAPPING-PREFIX = @ ;
//! LIST N = n np (n prop) ;
//! SET NOMINAL = N | ADJ - (n dem) ;
//! BEFORE-SECTIONS  SECTION  AFTER-SECTIONS
//! SELECT|REMOVE|IFF (target) [IF] ((test) …) ;
//! MAP|ADD|APPEND (tags) (target) [IF (…)] ;
//! SUBSTITUTE (old) (new) (target) [IF (…)] ;
//! DELIMIT (target) [IF (…)] ;
//! SETPARENT|SETCHILD (target) [IF (…)] TO ((pos) (set)) ;
//! ```
//!
//! Rules written before any section header land in an implicit first
//! section, so a one-rule grammar is a valid grammar.

use std::collections::HashMap;

use super::lexer::{Token, TokenKind, lex};
use super::ruleset::{Rule, RuleKind, RuleSet, Section, SectionKind, Test, TestFlags};
use super::sets::{SetDef, SetExpr, SetOp, SetOperand, resolve_all, resolve_operand};
use crate::errors::CompileError;
use crate::intern::Interner;
use crate::tags::{CompositeTag, Tag, TagParseError, TagSet};

/// Compile grammar source into a [`RuleSet`].
pub fn compile(source: &str, interner: &Interner) -> Result<RuleSet, CompileError> {
    let tokens = lex(source)?;
    GrammarParser { tokens, pos: 0, interner }.parse()
}

struct RawTest {
    offset: i32,
    flags: TestFlags,
    set: SetOperand,
    barrier: Option<SetOperand>,
    link: Option<Box<RawTest>>,
}

enum RawKind {
    Select,
    Remove,
    Iff,
    Unmap,
    Map(Vec<Tag>),
    Add(Vec<Tag>),
    Substitute(Vec<Tag>, Vec<Tag>),
    Append(Vec<Tag>),
    Delimit,
    SetParent(RawTest),
    SetChild(RawTest),
}

struct RawRule {
    kind: RawKind,
    target: SetOperand,
    tests: Vec<RawTest>,
    line: usize,
    keyword: &'static str,
}

struct RawSection {
    kind: SectionKind,
    rules: Vec<RawRule>,
}

const RULE_KEYWORDS: &[&str] = &[
    "SELECT",
    "REMOVE",
    "IFF",
    "MAP",
    "UNMAP",
    "ADD",
    "SUBSTITUTE",
    "APPEND",
    "DELIMIT",
    "SETPARENT",
    "SETCHILD",
];

struct GrammarParser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    interner: &'a Interner,
}

impl GrammarParser<'_> {
    fn parse(mut self) -> Result<RuleSet, CompileError> {
        let mut defs: Vec<(String, SetDef)> = Vec::new();
        let mut delimiters: Option<TagSet> = None;
        let mut mapping_prefix = '@';
        let mut sections: Vec<RawSection> = Vec::new();
        let mut main_count = 0usize;

        while let Some(token) = self.peek() {
            if token.kind != TokenKind::Word {
                return Err(self.err_at(token.line, token.column, format!("unexpected '{}'", token.text)));
            }
            let keyword = token.text.clone();
            let (line, column) = (token.line, token.column);

            match keyword.as_str() {
                "DELIMITERS" => {
                    self.advance();
                    self.expect(TokenKind::Equals, "'='")?;
                    let set = self.parse_tag_items_until_semicolon()?;
                    if delimiters.replace(set).is_some() {
                        return Err(self.err_at(line, column, "DELIMITERS defined twice".into()));
                    }
                }
                "MAPPING-PREFIX" => {
                    self.advance();
                    self.expect(TokenKind::Equals, "'='")?;
                    let word = self.expect_word("a prefix character")?;
                    let mut chars = word.text.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => mapping_prefix = c,
                        _ => {
                            return Err(self.err_at(
                                word.line,
                                word.column,
                                format!("MAPPING-PREFIX must be a single character, found '{}'", word.text),
                            ));
                        }
                    }
                    self.expect(TokenKind::Semicolon, "';'")?;
                }
                "LIST" => {
                    self.advance();
                    let name = self.expect_word("a set name")?;
                    if defs.iter().any(|(n, _)| *n == name.text) {
                        return Err(self.err_at(name.line, name.column, format!("set '{}' defined twice", name.text)));
                    }
                    self.expect(TokenKind::Equals, "'='")?;
                    let set = self.parse_tag_items_until_semicolon()?;
                    defs.push((name.text, SetDef::List(set)));
                }
                "SET" => {
                    self.advance();
                    let name = self.expect_word("a set name")?;
                    if defs.iter().any(|(n, _)| *n == name.text) {
                        return Err(self.err_at(name.line, name.column, format!("set '{}' defined twice", name.text)));
                    }
                    self.expect(TokenKind::Equals, "'='")?;
                    let expr = self.parse_set_expr()?;
                    defs.push((name.text, SetDef::Expr(expr)));
                }
                "BEFORE-SECTIONS" => {
                    self.advance();
                    sections.push(RawSection { kind: SectionKind::Before, rules: Vec::new() });
                }
                "SECTION" => {
                    self.advance();
                    main_count += 1;
                    sections.push(RawSection { kind: SectionKind::Main(main_count), rules: Vec::new() });
                }
                "AFTER-SECTIONS" => {
                    self.advance();
                    sections.push(RawSection { kind: SectionKind::After, rules: Vec::new() });
                }
                kw if RULE_KEYWORDS.contains(&kw) => {
                    let rule = self.parse_rule()?;
                    if sections.is_empty() {
                        main_count = 1;
                        sections.push(RawSection { kind: SectionKind::Main(1), rules: Vec::new() });
                    }
                    sections.last_mut().expect("section pushed above").rules.push(rule);
                }
                _ => {
                    return Err(self.err_at(line, column, format!("unexpected '{keyword}'")));
                }
            }
        }

        let sets = resolve_all(&defs)?;

        // BEFORE-SECTIONS first, mains in declaration order, AFTER-SECTIONS
        // last; declaration order is kept within each group.
        let mut ordered = sections;
        ordered.sort_by_key(|s| match s.kind {
            SectionKind::Before => 0,
            SectionKind::Main(_) => 1,
            SectionKind::After => 2,
        });

        let mut resolved_sections = Vec::with_capacity(ordered.len());
        for raw in ordered {
            let mut rules = Vec::with_capacity(raw.rules.len());
            for rule in raw.rules {
                rules.push(finish_rule(rule, &sets)?);
            }
            resolved_sections.push(Section { kind: raw.kind, rules });
        }

        Ok(RuleSet {
            sections: resolved_sections,
            sets,
            delimiters: delimiters.unwrap_or_default(),
            mapping_prefix,
        })
    }

    // --- Statement pieces ------------------------------------------------------

    /// Tag items of a `LIST`/`DELIMITERS` body: bare or quoted tags and
    /// parenthesized composites, up to the terminating semicolon.
    fn parse_tag_items_until_semicolon(&mut self) -> Result<TagSet, CompileError> {
        let mut alts = Vec::new();
        loop {
            let token = self.require("a tag or ';'")?;
            match token.kind {
                TokenKind::Semicolon => {
                    self.advance();
                    if alts.is_empty() {
                        return Err(self.err_at(token.line, token.column, "empty tag list".into()));
                    }
                    return Ok(TagSet::new(alts));
                }
                TokenKind::Word => {
                    let tag = self.parse_tag_token()?;
                    alts.push(CompositeTag::single(tag));
                }
                TokenKind::LParen => {
                    alts.push(self.parse_composite()?);
                }
                _ => {
                    return Err(self.err_at(
                        token.line,
                        token.column,
                        format!("expected a tag or ';', found '{}'", token.text),
                    ));
                }
            }
        }
    }

    /// `( tag tag … )` — one composite alternative.
    fn parse_composite(&mut self) -> Result<CompositeTag, CompileError> {
        let open = self.expect(TokenKind::LParen, "'('")?;
        let mut members = Vec::new();
        loop {
            let token = self.require("a tag or ')'")?;
            match token.kind {
                TokenKind::RParen => {
                    self.advance();
                    if members.is_empty() {
                        return Err(self.err_at(open.line, open.column, "empty tag group".into()));
                    }
                    return Ok(CompositeTag::new(members));
                }
                TokenKind::Word => members.push(self.parse_tag_token()?),
                _ => {
                    return Err(self.err_at(
                        token.line,
                        token.column,
                        format!("expected a tag or ')', found '{}'", token.text),
                    ));
                }
            }
        }
    }

    fn parse_set_expr(&mut self) -> Result<SetExpr, CompileError> {
        let first = self.parse_set_operand()?;
        let mut rest = Vec::new();
        loop {
            let token = self.require("an operator or ';'")?;
            let op = match token.kind {
                TokenKind::Semicolon => {
                    self.advance();
                    return Ok(SetExpr { first, rest });
                }
                TokenKind::Pipe => SetOp::Union,
                TokenKind::Minus => SetOp::Difference,
                TokenKind::Plus => SetOp::Combine,
                TokenKind::Word if token.text == "OR" => SetOp::Union,
                _ => {
                    return Err(self.err_at(
                        token.line,
                        token.column,
                        format!("expected '|', '-', '+', 'OR' or ';', found '{}'", token.text),
                    ));
                }
            };
            self.advance();
            rest.push((op, self.parse_set_operand()?));
        }
    }

    /// A set reference: a named set, a quoted tag, or a parenthesized composite.
    fn parse_set_operand(&mut self) -> Result<SetOperand, CompileError> {
        let token = self.require("a set")?;
        match token.kind {
            TokenKind::LParen => Ok(SetOperand::Inline(TagSet::new(vec![self.parse_composite()?]))),
            TokenKind::Word if token.text.starts_with('"') => {
                let tag = self.parse_tag_token()?;
                Ok(SetOperand::Inline(TagSet::new(vec![CompositeTag::single(tag)])))
            }
            TokenKind::Word => {
                let token = self.advance().expect("peeked above");
                Ok(SetOperand::Named { name: token.text, line: token.line })
            }
            _ => Err(self.err_at(token.line, token.column, format!("expected a set, found '{}'", token.text))),
        }
    }

    // --- Rules -----------------------------------------------------------------

    fn parse_rule(&mut self) -> Result<RawRule, CompileError> {
        let kw = self.expect_word("a rule keyword")?;
        let line = kw.line;

        let (kind, target, tests) = match kw.text.as_str() {
            "SELECT" | "REMOVE" | "IFF" | "UNMAP" | "DELIMIT" => {
                let target = self.parse_set_operand()?;
                let tests = self.parse_if_tests()?;
                let kind = match kw.text.as_str() {
                    "SELECT" => RawKind::Select,
                    "REMOVE" => RawKind::Remove,
                    "IFF" => RawKind::Iff,
                    "UNMAP" => RawKind::Unmap,
                    _ => RawKind::Delimit,
                };
                (kind, target, tests)
            }
            "MAP" | "ADD" | "APPEND" => {
                let tags = self.parse_composite()?.members().to_vec();
                let target = self.parse_set_operand()?;
                let tests = self.parse_if_tests()?;
                let kind = match kw.text.as_str() {
                    "MAP" => RawKind::Map(tags),
                    "ADD" => RawKind::Add(tags),
                    _ => RawKind::Append(tags),
                };
                (kind, target, tests)
            }
            "SUBSTITUTE" => {
                let old = self.parse_composite()?.members().to_vec();
                let new = self.parse_composite()?.members().to_vec();
                let target = self.parse_set_operand()?;
                let tests = self.parse_if_tests()?;
                (RawKind::Substitute(old, new), target, tests)
            }
            "SETPARENT" | "SETCHILD" => {
                let target = self.parse_set_operand()?;
                let tests = self.parse_if_tests()?;
                let to_kw = self.expect_word("'TO'")?;
                if to_kw.text != "TO" {
                    return Err(self.err_at(to_kw.line, to_kw.column, format!("expected 'TO', found '{}'", to_kw.text)));
                }
                self.expect(TokenKind::LParen, "'('")?;
                let to = self.parse_test()?;
                self.expect(TokenKind::RParen, "')'")?;
                let kind = if kw.text == "SETPARENT" { RawKind::SetParent(to) } else { RawKind::SetChild(to) };
                (kind, target, tests)
            }
            other => unreachable!("dispatch guarantees a rule keyword, got {other}"),
        };

        self.expect(TokenKind::Semicolon, "';'")?;

        let keyword = RULE_KEYWORDS.iter().copied().find(|&k| k == kw.text).expect("checked by dispatch");
        Ok(RawRule { kind, target, tests, line, keyword })
    }

    /// `[IF] ((test) (test) …)` — the IF keyword is optional, the groups may
    /// be absent entirely.
    fn parse_if_tests(&mut self) -> Result<Vec<RawTest>, CompileError> {
        if let Some(token) = self.peek() {
            if token.kind == TokenKind::Word && token.text == "IF" {
                self.advance();
            }
        }
        let mut tests = Vec::new();
        while let Some(token) = self.peek() {
            if token.kind != TokenKind::LParen {
                break;
            }
            self.advance();
            tests.push(self.parse_test()?);
            self.expect(TokenKind::RParen, "')'")?;
        }
        Ok(tests)
    }

    /// One context test, cursor just past the opening paren:
    /// `[NOT|NEGATE] pos set [BARRIER|CBARRIER set] [LINK …]`.
    fn parse_test(&mut self) -> Result<RawTest, CompileError> {
        let mut flags = TestFlags::empty();

        let token = self.require("a position")?;
        if token.kind == TokenKind::Word && token.text == "NOT" {
            flags |= TestFlags::NEGATED;
            self.advance();
        } else if token.kind == TokenKind::Word && token.text == "NEGATE" {
            flags |= TestFlags::NEGATE_ALL;
            self.advance();
        }

        let pos = self.expect_word("a position")?;
        let (offset, pos_flags) = parse_position(&pos)?;
        flags |= pos_flags;

        let set = self.parse_set_operand()?;

        let mut barrier = None;
        if let Some(token) = self.peek() {
            if token.kind == TokenKind::Word && (token.text == "BARRIER" || token.text == "CBARRIER") {
                if !flags.scans() {
                    return Err(self.err_at(
                        token.line,
                        token.column,
                        format!("{} requires a scanning position", token.text),
                    ));
                }
                if token.text == "CBARRIER" {
                    flags |= TestFlags::CAREFUL_BARRIER;
                }
                self.advance();
                barrier = Some(self.parse_set_operand()?);
            }
        }

        let mut link = None;
        if let Some(token) = self.peek() {
            if token.kind == TokenKind::Word && token.text == "LINK" {
                self.advance();
                link = Some(Box::new(self.parse_test()?));
            }
        }

        Ok(RawTest { offset, flags, set, barrier, link })
    }

    // --- Token plumbing --------------------------------------------------------

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn require(&self, what: &str) -> Result<Token, CompileError> {
        self.peek().cloned().ok_or_else(|| self.eof_err(what))
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, CompileError> {
        let token = self.require(what)?;
        if token.kind != kind {
            return Err(self.err_at(token.line, token.column, format!("expected {what}, found '{}'", token.text)));
        }
        self.advance();
        Ok(token)
    }

    fn expect_word(&mut self, what: &str) -> Result<Token, CompileError> {
        self.expect(TokenKind::Word, what)
    }

    /// Parse the token under the cursor as a single tag and consume it.
    fn parse_tag_token(&mut self) -> Result<Tag, CompileError> {
        let token = self.expect_word("a tag")?;
        Tag::parse(&token.text, self.interner).map_err(|err| match err {
            TagParseError::Syntax(message) => self.err_at(token.line, token.column, message),
            TagParseError::Invalid(source) => CompileError::InvalidTag { line: token.line, source },
        })
    }

    fn err_at(&self, line: usize, column: usize, message: String) -> CompileError {
        CompileError::Syntax { line, column, message }
    }

    fn eof_err(&self, what: &str) -> CompileError {
        let (line, column) = self
            .tokens
            .last()
            .map(|t| (t.line, t.column + t.text.chars().count()))
            .unwrap_or((1, 1));
        CompileError::Syntax { line, column, message: format!("expected {what}, found end of grammar") }
    }
}

/// Parse a position word like `0`, `-1`, `1C`, `*-1W`, `**2C`.
fn parse_position(token: &Token) -> Result<(i32, TestFlags), CompileError> {
    let re = crate::regex!(r"^(\*{1,2})?(-?\d+)([CW]*)$");
    let caps = re.captures(&token.text).ok_or_else(|| CompileError::Syntax {
        line: token.line,
        column: token.column,
        message: format!("invalid position '{}'", token.text),
    })?;

    let mut flags = TestFlags::empty();
    match caps.get(1).map(|m| m.as_str()) {
        Some("*") => flags |= TestFlags::SCAN,
        Some("**") => flags |= TestFlags::SCAN | TestFlags::SCAN_ALL,
        _ => {}
    }

    let offset: i32 = caps[2].parse().map_err(|_| CompileError::Syntax {
        line: token.line,
        column: token.column,
        message: format!("position offset out of range in '{}'", token.text),
    })?;

    for c in caps[3].chars() {
        let flag = if c == 'C' { TestFlags::CAREFUL } else { TestFlags::SPAN };
        if flags.contains(flag) {
            return Err(CompileError::Syntax {
                line: token.line,
                column: token.column,
                message: format!("duplicate '{c}' in position '{}'", token.text),
            });
        }
        flags |= flag;
    }

    if flags.scans() && offset == 0 {
        return Err(CompileError::Syntax {
            line: token.line,
            column: token.column,
            message: "scanning position must have a non-zero offset".into(),
        });
    }

    Ok((offset, flags))
}

// --- Resolution ----------------------------------------------------------------

fn finish_rule(raw: RawRule, sets: &HashMap<String, TagSet>) -> Result<Rule, CompileError> {
    let kind = match raw.kind {
        RawKind::Select => RuleKind::Select,
        RawKind::Remove => RuleKind::Remove,
        RawKind::Iff => RuleKind::Iff,
        RawKind::Unmap => RuleKind::Unmap,
        RawKind::Map(tags) => RuleKind::Map { tags },
        RawKind::Add(tags) => RuleKind::Add { tags },
        RawKind::Substitute(old, new) => RuleKind::Substitute { old, new },
        RawKind::Append(tags) => RuleKind::Append { tags },
        RawKind::Delimit => RuleKind::Delimit,
        RawKind::SetParent(to) => RuleKind::SetParent { to: finish_test(to, sets)? },
        RawKind::SetChild(to) => RuleKind::SetChild { to: finish_test(to, sets)? },
    };

    let target = resolve_operand(&raw.target, sets)?;
    let mut tests = Vec::with_capacity(raw.tests.len());
    for test in raw.tests {
        tests.push(finish_test(test, sets)?);
    }

    let name = format!("{}:{}", raw.keyword, raw.line);
    Ok(Rule { kind, target, tests, line: raw.line, name })
}

fn finish_test(raw: RawTest, sets: &HashMap<String, TagSet>) -> Result<Test, CompileError> {
    let link = match raw.link {
        Some(inner) => Some(Box::new(finish_test(*inner, sets)?)),
        None => None,
    };
    let barrier = match raw.barrier {
        Some(operand) => Some(resolve_operand(&operand, sets)?),
        None => None,
    };
    Ok(Test { offset: raw.offset, flags: raw.flags, set: resolve_operand(&raw.set, sets)?, barrier, link })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile_ok(source: &str) -> RuleSet {
        compile(source, &Interner::new()).unwrap()
    }

    #[test]
    fn one_rule_grammar_compiles_into_implicit_section() {
        let ruleset = compile_ok("REMOVE (verb) IF (0 (noun)) ;");
        assert_eq!(ruleset.sections.len(), 1);
        assert_eq!(ruleset.sections[0].kind, SectionKind::Main(1));
        let rule = &ruleset.sections[0].rules[0];
        assert!(matches!(rule.kind, RuleKind::Remove));
        assert_eq!(rule.tests.len(), 1);
        assert_eq!(rule.tests[0].offset, 0);
        assert_eq!(rule.name, "REMOVE:1");
    }

    #[test]
    fn sections_are_ordered_before_main_after() {
        let ruleset = compile_ok(
            "AFTER-SECTIONS\nREMOVE (a) ;\nBEFORE-SECTIONS\nREMOVE (b) ;\nSECTION\nREMOVE (c) ;\n",
        );
        let kinds: Vec<SectionKind> = ruleset.sections.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![SectionKind::Before, SectionKind::Main(1), SectionKind::After]);
    }

    #[test]
    fn named_sets_resolve_in_rules() {
        let ruleset = compile_ok("LIST V = v aux ;\nLIST N = n ;\nSET VN = V | N ;\nSELECT VN IF (-1 N) ;\n");
        let rule = &ruleset.sections[0].rules[0];
        assert_eq!(rule.target.alts().len(), 3);
        assert_eq!(rule.tests[0].set.alts().len(), 1);
    }

    #[test]
    fn position_words() {
        let cases: Vec<(&str, i32, TestFlags)> = vec![
            ("(0 (x))", 0, TestFlags::empty()),
            ("(-2 (x))", -2, TestFlags::empty()),
            ("(1C (x))", 1, TestFlags::CAREFUL),
            ("(*-1 (x))", -1, TestFlags::SCAN),
            ("(**3 (x))", 3, TestFlags::SCAN | TestFlags::SCAN_ALL),
            ("(*1W (x))", 1, TestFlags::SCAN | TestFlags::SPAN),
            ("(NOT 1 (x))", 1, TestFlags::NEGATED),
            ("(NEGATE 1 (x))", 1, TestFlags::NEGATE_ALL),
            ("(*1 (x) CBARRIER (y))", 1, TestFlags::SCAN | TestFlags::CAREFUL_BARRIER),
        ];
        for (test, offset, flags) in cases {
            let ruleset = compile_ok(&format!("REMOVE (v) IF {test} ;"));
            let parsed = &ruleset.sections[0].rules[0].tests[0];
            assert_eq!(parsed.offset, offset, "{test}");
            assert_eq!(parsed.flags, flags, "{test}");
        }
    }

    #[test]
    fn linked_tests_nest() {
        let ruleset = compile_ok("SELECT (n) IF (*1 (v) BARRIER (clb) LINK 2 (det)) ;");
        let test = &ruleset.sections[0].rules[0].tests[0];
        assert!(test.flags.contains(TestFlags::SCAN));
        assert!(test.barrier.is_some());
        let link = test.link.as_deref().unwrap();
        assert_eq!(link.offset, 2);
        assert!(link.link.is_none());
    }

    #[test]
    fn map_substitute_and_dependency_rules() {
        let ruleset = compile_ok(
            "MAPPING-PREFIX = @ ;\nLIST V = v ;\nMAP (@pred) V IF (0 (v)) ;\nSUBSTITUTE (sg) (pl) V ;\nSETPARENT (det) TO (1 (n)) ;\n",
        );
        let rules = &ruleset.sections[0].rules;
        assert!(matches!(&rules[0].kind, RuleKind::Map { tags } if tags.len() == 1));
        assert!(matches!(&rules[1].kind, RuleKind::Substitute { old, new } if old.len() == 1 && new.len() == 1));
        assert!(matches!(&rules[2].kind, RuleKind::SetParent { to } if to.offset == 1));
        assert_eq!(ruleset.mapping_prefix, '@');
    }

    #[test]
    fn delimiters_statement() {
        let ruleset = compile_ok("DELIMITERS = \"<$.>\" \"<$!>\" ;\nREMOVE (v) ;");
        assert_eq!(ruleset.delimiters.alts().len(), 2);
    }

    #[test]
    fn syntax_errors_carry_position() {
        match compile("LIST N = ;", &Interner::new()) {
            Err(CompileError::Syntax { line, column, .. }) => {
                assert_eq!(line, 1);
                assert_eq!(column, 10);
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
        match compile("SELECT (v)\nIF (zz (n)) ;", &Interner::new()) {
            Err(CompileError::Syntax { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn undefined_set_in_rule() {
        match compile("SELECT Missing ;", &Interner::new()) {
            Err(CompileError::UndefinedSet { name, line }) => {
                assert_eq!(name, "Missing");
                assert_eq!(line, 1);
            }
            other => panic!("expected undefined set, got {other:?}"),
        }
    }

    #[test]
    fn cyclic_sets_in_grammar() {
        let source = "LIST N = n ;\nSET A = B ;\nSET B = A ;\nSELECT A ;";
        match compile(source, &Interner::new()) {
            Err(CompileError::CyclicSet { cycle }) => assert!(cycle.len() >= 3),
            other => panic!("expected cyclic set, got {other:?}"),
        }
    }

    #[test]
    fn scan_with_zero_offset_is_rejected() {
        assert!(matches!(
            compile("SELECT (v) IF (*0 (n)) ;", &Interner::new()),
            Err(CompileError::Syntax { .. })
        ));
    }

    #[test]
    fn barrier_without_scan_is_rejected() {
        assert!(matches!(
            compile("SELECT (v) IF (1 (n) BARRIER (clb)) ;", &Interner::new()),
            Err(CompileError::Syntax { .. })
        ));
    }
}

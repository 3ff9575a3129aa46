//! Line Transform - Filter and Rewrite
//!
//! Every input line goes through, in order:
//! 1. self-include skip
//! 2. blacklist pass (handled lines are emitted as-is and stop here)
//! 3. parameter-override pass
//! 4. canonicalization

use crate::rules::{mentions_bare, mentions_member, mentions_qualified, Blacklist, ParamOverrideTable};

const RID_REF: (&str, &str) = ("const RID&", "RID");

/// Extension type names rewritten to their public counterparts.
pub const DEFAULT_TYPE_RENAMES: [(&str, &str); 3] = [
    ("PhysicsServer3DExtension", "PhysicsServer3D"),
    ("PhysicsDirectBodyState3DExtension", "PhysicsDirectBodyState3D"),
    ("PhysicsDirectSpaceState3DExtension", "PhysicsDirectSpaceState3D"),
];

/// Internal-convention prefixes, stripped before type renames.
const PREFIX_STRIPS: [(&str, &str); 3] = [(" _", " "), ("(_", "("), ("::_", "::")];

/// Alias narrowing, applied after type renames.
const ALIAS_REWRITES: [(&str, &str); 3] = [
    RID_REF,
    ("double", "real_t"),
    ("uint64_t p_id", "ObjectID p_id"),
];

/// Public-name rewriting applied to every line that reaches the output
/// through the override pass.
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    type_renames: Vec<(String, String)>,
}

impl Canonicalizer {
    pub fn new() -> Self {
        Self {
            type_renames: DEFAULT_TYPE_RENAMES
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }

    /// Defaults followed by `extra`, in order.
    pub fn with_type_renames(extra: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut canonicalizer = Self::new();
        canonicalizer.type_renames.extend(extra);
        canonicalizer
    }

    pub fn type_renames(&self) -> &[(String, String)] {
        &self.type_renames
    }

    pub fn apply(&self, line: &str) -> String {
        let mut out = line.to_string();
        for (from, to) in PREFIX_STRIPS {
            out = out.replace(from, to);
        }
        // Whole-word only: the name must be followed by a space or `)`.
        for (from, to) in &self.type_renames {
            for terminator in [' ', ')'] {
                out = out.replace(&format!("{}{}", from, terminator), &format!("{}{}", to, terminator));
            }
        }
        for (from, to) in ALIAS_REWRITES {
            out = out.replace(from, to);
        }
        out
    }
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// What happened to one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Self-include of the unit's own generated header; not emitted.
    Skipped,
    /// Matched the blacklist; emitted without further rewriting.
    Blacklisted(String),
    /// Went through overrides and canonicalization.
    Rewritten(String),
}

impl LineOutcome {
    pub fn emitted(&self) -> Option<&str> {
        match self {
            Self::Skipped => None,
            Self::Blacklisted(line) | Self::Rewritten(line) => Some(line),
        }
    }
}

/// Applies one unit's rules to its lines.
pub struct LineTransformer<'a> {
    self_include: &'a str,
    blacklist: &'a Blacklist,
    overrides: &'a ParamOverrideTable,
    canonicalizer: &'a Canonicalizer,
}

impl<'a> LineTransformer<'a> {
    pub fn new(
        self_include: &'a str,
        blacklist: &'a Blacklist,
        overrides: &'a ParamOverrideTable,
        canonicalizer: &'a Canonicalizer,
    ) -> Self {
        Self {
            self_include,
            blacklist,
            overrides,
            canonicalizer,
        }
    }

    /// Transform one line. The line terminator, if any, is carried through.
    pub fn transform(&self, line: &str) -> LineOutcome {
        if !self.self_include.is_empty() && line.contains(self.self_include) {
            return LineOutcome::Skipped;
        }

        let mut line = line.to_string();
        if !self.blacklist.is_empty() {
            // Narrowed before matching so `const RID&` signatures compare
            // the same way their definitions do.
            line = line.replace(RID_REF.0, RID_REF.1);
            if let Some(handled) = self.blacklist_pass(&line) {
                return LineOutcome::Blacklisted(handled);
            }
        }

        let line = self.override_pass(line);
        LineOutcome::Rewritten(self.canonicalizer.apply(&line))
    }

    fn blacklist_pass(&self, line: &str) -> Option<String> {
        for name in self.blacklist.iter() {
            if mentions_qualified(line, name) {
                return Some(line.to_string());
            }
            if mentions_bare(line, name) {
                return Some(line.replace(" override;", ";"));
            }
        }
        None
    }

    fn override_pass(&self, mut line: String) -> String {
        for (member, record) in self.overrides.iter() {
            if !mentions_member(&line, member) {
                continue;
            }
            if let Some(return_type) = &record.override_return_type {
                line = replace_first_token(&line, return_type);
            }
            if let Some((find, replace)) = &record.text_replace {
                if !find.is_empty() {
                    line = line.replace(find.as_str(), replace);
                }
            }
        }
        line
    }
}

/// Swap everything before the first space. A line without a space is
/// replaced whole, keeping its terminator.
fn replace_first_token(line: &str, replacement: &str) -> String {
    match line.split_once(' ') {
        Some((_, rest)) => format!("{} {}", replacement, rest),
        None => {
            let terminator = &line[line.trim_end_matches(|c| c == '\r' || c == '\n').len()..];
            format!("{}{}", replacement, terminator)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::OverrideRecord;

    fn run(line: &str, blacklist: &Blacklist, overrides: &ParamOverrideTable) -> LineOutcome {
        let canonicalizer = Canonicalizer::new();
        LineTransformer::new("shape.gen.hpp", blacklist, overrides, &canonicalizer).transform(line)
    }

    #[test]
    fn test_blacklisted_definition_kept_verbatim() {
        let blacklist: Blacklist = ["bar"].into_iter().collect();
        let out = run("void Foo::bar(int x)\n", &blacklist, &ParamOverrideTable::new());
        assert_eq!(out, LineOutcome::Blacklisted("void Foo::bar(int x)\n".into()));
    }

    #[test]
    fn test_blacklisted_declaration_loses_override() {
        let blacklist: Blacklist = ["bar"].into_iter().collect();
        let out = run("  virtual void bar(int x) override;\n", &blacklist, &ParamOverrideTable::new());
        assert_eq!(out.emitted(), Some("  virtual void bar(int x);\n"));
    }

    #[test]
    fn test_blacklisted_line_skips_canonicalization() {
        let blacklist: Blacklist = ["_step"].into_iter().collect();
        let out = run("\tvoid _step(double p_delta) override;\n", &blacklist, &ParamOverrideTable::new());
        assert_eq!(out.emitted(), Some("\tvoid _step(double p_delta);\n"));
    }

    #[test]
    fn test_blacklist_narrows_rid_before_matching() {
        let blacklist: Blacklist = ["_free_rid"].into_iter().collect();
        let out = run("\tvoid _free_rid(const RID& p_rid) override;\n", &blacklist, &ParamOverrideTable::new());
        assert_eq!(out.emitted(), Some("\tvoid _free_rid(RID p_rid);\n"));
    }

    #[test]
    fn test_qualified_match_wins_over_later_names() {
        let blacklist: Blacklist = ["_a", "_b"].into_iter().collect();
        let out = run("int Foo::_a() { return _b(); } override;\n", &blacklist, &ParamOverrideTable::new());
        // `_a` matches qualified first, so the override marker is left alone.
        assert_eq!(out.emitted(), Some("int Foo::_a() { return _b(); } override;\n"));
    }

    #[test]
    fn test_self_include_dropped() {
        let out = run("#include \"shape.gen.hpp\"\n", &Blacklist::new(), &ParamOverrideTable::new());
        assert_eq!(out, LineOutcome::Skipped);
        assert_eq!(out.emitted(), None);
    }

    #[test]
    fn test_return_type_and_text_replace_on_one_line() {
        let overrides: ParamOverrideTable = [(
            "_get_state",
            OverrideRecord::return_type("PhysicsDirectBodyState3D*").with_text_replace("p_body", "p_rid"),
        )]
        .into_iter()
        .collect();

        let out = run("State* Body::_get_state(RID p_body) {\n", &Blacklist::new(), &overrides);
        assert_eq!(
            out,
            LineOutcome::Rewritten("PhysicsDirectBodyState3D* Body::get_state(RID p_rid) {\n".into())
        );
    }

    #[test]
    fn test_overlapping_overrides_apply_in_authoring_order() {
        let overrides: ParamOverrideTable = [
            ("_zz", OverrideRecord::text_replace("A", "B")),
            ("_aa", OverrideRecord::text_replace("B", "C")),
        ]
        .into_iter()
        .collect();

        let out = run("void f(A a) { _zz(); _aa(); }\n", &Blacklist::new(), &overrides);
        assert_eq!(out.emitted(), Some("void f(C a) { zz(); aa(); }\n"));
    }

    #[test]
    fn test_return_type_on_line_without_spaces_keeps_terminator() {
        let overrides: ParamOverrideTable =
            [("_x", OverrideRecord::return_type("int"))].into_iter().collect();
        let out = run("Foo::_x();\n", &Blacklist::new(), &overrides);
        assert_eq!(out.emitted(), Some("int\n"));
    }

    #[test]
    fn test_unmatched_rules_are_no_ops() {
        let blacklist: Blacklist = ["_missing"].into_iter().collect();
        let overrides: ParamOverrideTable =
            [("_absent", OverrideRecord::return_type("int"))].into_iter().collect();
        let out = run("\tint get_count() const;\n", &blacklist, &overrides);
        assert_eq!(out.emitted(), Some("\tint get_count() const;\n"));
    }

    #[test]
    fn test_canonicalization_strips_prefixes_and_renames_types() {
        let canonicalizer = Canonicalizer::new();
        assert_eq!(
            canonicalizer.apply("int Foo::_compute(PhysicsServer3DExtension *p_server) const;"),
            "int Foo::compute(PhysicsServer3D *p_server) const;"
        );
        assert_eq!(canonicalizer.apply("\tvoid _compute();"), "\tvoid compute();");
        assert_eq!(
            canonicalizer.apply("f(_x, (PhysicsDirectSpaceState3DExtension) s)"),
            "f(x, (PhysicsDirectSpaceState3D) s)"
        );
    }

    #[test]
    fn test_canonicalization_leaves_longer_type_names() {
        let canonicalizer = Canonicalizer::new();
        assert_eq!(
            canonicalizer.apply("PhysicsServer3DExtensionMotionResult* r"),
            "PhysicsServer3DExtensionMotionResult* r"
        );
    }

    #[test]
    fn test_canonicalization_aliases() {
        let canonicalizer = Canonicalizer::new();
        assert_eq!(
            canonicalizer.apply("double f(const RID& p_rid, uint64_t p_id);"),
            "real_t f(RID p_rid, ObjectID p_id);"
        );
    }

    #[test]
    fn test_extra_type_renames() {
        let canonicalizer = Canonicalizer::with_type_renames([(
            "PhysicsServer2DExtension".to_string(),
            "PhysicsServer2D".to_string(),
        )]);
        assert_eq!(canonicalizer.type_renames().len(), 4);
        assert_eq!(canonicalizer.apply("PhysicsServer2DExtension *s"), "PhysicsServer2D *s");
    }
}

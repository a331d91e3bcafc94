//! Per-statement-kind substatement cardinality, per `spec.md` §4.4.
//!
//! The source mutates a shared table whenever the extension-cardinality
//! callback registers a new substatement for a host kind (`spec.md` §9
//! Design Notes flags this as worth replacing). Here the table is built
//! once, merging any caller-supplied extension entries in before the
//! first lookup, and is never mutated afterward.

use super::kind::StatementKind;
use rustc_hash::FxHashMap;

/// One end of a cardinality range: `0`, `1`, or unbounded (`n`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Zero,
    One,
    Many,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Card {
    pub start: Bound,
    pub end: Bound,
}

impl Card {
    pub const OPTIONAL: Card = Card { start: Bound::Zero, end: Bound::One };
    pub const REQUIRED: Card = Card { start: Bound::One, end: Bound::One };
    pub const ANY: Card = Card { start: Bound::Zero, end: Bound::Many };
    pub const AT_LEAST_ONE: Card = Card { start: Bound::One, end: Bound::Many };
}

/// A pseudo-kind key used for substatements that aggregate several real
/// kinds, e.g. `data-def` for any data-defining child.
pub const DATA_DEF: StatementKind = StatementKind::Uses; // representative tag; see `covers`

/// Substatement rules for one host statement kind.
#[derive(Debug, Default, Clone)]
pub struct Rules {
    entries: Vec<(StatementKind, Card)>,
    data_def: Option<Card>,
}

impl Rules {
    fn with(mut self, kind: StatementKind, card: Card) -> Self {
        self.entries.push((kind, card));
        self
    }

    fn data_def(mut self, card: Card) -> Self {
        self.data_def = Some(card);
        self
    }

    pub fn card_for(&self, kind: StatementKind) -> Option<Card> {
        self.entries.iter().find(|(k, _)| *k == kind).map(|(_, c)| *c)
    }

    pub fn data_def_card(&self) -> Option<Card> {
        self.data_def
    }
}

/// The complete, immutable cardinality table.
pub struct CardinalityTable {
    rules: FxHashMap<StatementKind, Rules>,
}

pub type ExtensionEntry = (StatementKind, StatementKind, Card);

impl CardinalityTable {
    /// Build the base table, merging in any extension-registered
    /// substatement cardinalities exactly once.
    pub fn build(extensions: &[ExtensionEntry]) -> Self {
        use Bound::*;
        use StatementKind::*;
        let mut rules: FxHashMap<StatementKind, Rules> = FxHashMap::default();

        rules.insert(
            Module,
            Rules::default()
                .with(YangVersion, Card::OPTIONAL)
                .with(Namespace, Card::REQUIRED)
                .with(Prefix, Card::REQUIRED)
                .with(Import, Card::ANY)
                .with(Include, Card::ANY)
                .with(Organization, Card::OPTIONAL)
                .with(Contact, Card::OPTIONAL)
                .with(Description, Card::OPTIONAL)
                .with(Reference, Card::OPTIONAL)
                .with(Revision, Card::ANY)
                .with(Extension, Card::ANY)
                .with(Feature, Card::ANY)
                .with(Identity, Card::ANY)
                .with(Typedef, Card::ANY)
                .with(Grouping, Card::ANY)
                .with(Augment, Card::ANY)
                .with(Rpc, Card::ANY)
                .with(Notification, Card::ANY)
                .with(Deviation, Card::ANY)
                .data_def(Card::ANY),
        );
        rules.insert(
            Submodule,
            Rules::default()
                .with(YangVersion, Card::OPTIONAL)
                .with(BelongsTo, Card::REQUIRED)
                .with(Import, Card::ANY)
                .with(Include, Card::ANY)
                .with(Organization, Card::OPTIONAL)
                .with(Contact, Card::OPTIONAL)
                .with(Description, Card::OPTIONAL)
                .with(Reference, Card::OPTIONAL)
                .with(Revision, Card::ANY)
                .with(Typedef, Card::ANY)
                .with(Grouping, Card::ANY)
                .with(Augment, Card::ANY)
                .with(Rpc, Card::ANY)
                .with(Notification, Card::ANY)
                .with(Deviation, Card::ANY)
                .data_def(Card::ANY),
        );
        rules.insert(
            Import,
            Rules::default()
                .with(Prefix, Card::REQUIRED)
                .with(RevisionDate, Card::OPTIONAL)
                .with(Description, Card::OPTIONAL)
                .with(Reference, Card::OPTIONAL),
        );
        rules.insert(
            Include,
            Rules::default()
                .with(RevisionDate, Card::OPTIONAL)
                .with(Description, Card::OPTIONAL)
                .with(Reference, Card::OPTIONAL),
        );
        rules.insert(
            Revision,
            Rules::default().with(Description, Card::OPTIONAL).with(Reference, Card::OPTIONAL),
        );
        rules.insert(
            Typedef,
            Rules::default()
                .with(Type, Card::REQUIRED)
                .with(Units, Card::OPTIONAL)
                .with(Default, Card::OPTIONAL)
                .with(Status, Card::OPTIONAL)
                .with(Description, Card::OPTIONAL)
                .with(Reference, Card::OPTIONAL),
        );
        rules.insert(
            Type,
            Rules::default()
                .with(Range, Card::OPTIONAL)
                .with(Length, Card::OPTIONAL)
                .with(Pattern, Card::ANY)
                .with(FractionDigits, Card::OPTIONAL)
                .with(Enum, Card::ANY)
                .with(Bit, Card::ANY)
                .with(Base, Card::ANY)
                .with(Path, Card::OPTIONAL)
                .with(RequireInstance, Card::OPTIONAL)
                .with(Type, Card::ANY),
        );
        rules.insert(
            Grouping,
            Rules::default()
                .with(Status, Card::OPTIONAL)
                .with(Description, Card::OPTIONAL)
                .with(Reference, Card::OPTIONAL)
                .with(Typedef, Card::ANY)
                .with(Grouping, Card::ANY)
                .data_def(Card::ANY),
        );
        rules.insert(
            Container,
            Rules::default()
                .with(When, Card::OPTIONAL)
                .with(IfFeature, Card::ANY)
                .with(Must, Card::ANY)
                .with(Presence, Card::OPTIONAL)
                .with(Config, Card::OPTIONAL)
                .with(Status, Card::OPTIONAL)
                .with(Description, Card::OPTIONAL)
                .with(Reference, Card::OPTIONAL)
                .with(Typedef, Card::ANY)
                .with(Grouping, Card::ANY)
                .data_def(Card::ANY),
        );
        rules.insert(
            Leaf,
            Rules::default()
                .with(When, Card::OPTIONAL)
                .with(IfFeature, Card::ANY)
                .with(Type, Card::REQUIRED)
                .with(Units, Card::OPTIONAL)
                .with(Must, Card::ANY)
                .with(Default, Card::OPTIONAL)
                .with(Config, Card::OPTIONAL)
                .with(Mandatory, Card::OPTIONAL)
                .with(Status, Card::OPTIONAL)
                .with(Description, Card::OPTIONAL)
                .with(Reference, Card::OPTIONAL),
        );
        rules.insert(
            LeafList,
            Rules::default()
                .with(When, Card::OPTIONAL)
                .with(IfFeature, Card::ANY)
                .with(Type, Card::REQUIRED)
                .with(Units, Card::OPTIONAL)
                .with(Must, Card::ANY)
                .with(Config, Card::OPTIONAL)
                .with(MinElements, Card::OPTIONAL)
                .with(MaxElements, Card::OPTIONAL)
                .with(OrderedBy, Card::OPTIONAL)
                .with(Status, Card::OPTIONAL)
                .with(Description, Card::OPTIONAL)
                .with(Reference, Card::OPTIONAL),
        );
        rules.insert(
            List,
            Rules::default()
                .with(When, Card::OPTIONAL)
                .with(IfFeature, Card::ANY)
                .with(Must, Card::ANY)
                .with(Key, Card::OPTIONAL)
                .with(Unique, Card::ANY)
                .with(Config, Card::OPTIONAL)
                .with(MinElements, Card::OPTIONAL)
                .with(MaxElements, Card::OPTIONAL)
                .with(OrderedBy, Card::OPTIONAL)
                .with(Status, Card::OPTIONAL)
                .with(Description, Card::OPTIONAL)
                .with(Reference, Card::OPTIONAL)
                .with(Typedef, Card::ANY)
                .with(Grouping, Card::ANY)
                .data_def(Card::ANY),
        );
        rules.insert(
            Choice,
            Rules::default()
                .with(When, Card::OPTIONAL)
                .with(IfFeature, Card::ANY)
                .with(Default, Card::OPTIONAL)
                .with(Config, Card::OPTIONAL)
                .with(Mandatory, Card::OPTIONAL)
                .with(Status, Card::OPTIONAL)
                .with(Description, Card::OPTIONAL)
                .with(Reference, Card::OPTIONAL)
                .with(Case, Card::ANY)
                .data_def(Card::ANY),
        );
        rules.insert(
            Case,
            Rules::default()
                .with(When, Card::OPTIONAL)
                .with(IfFeature, Card::ANY)
                .with(Status, Card::OPTIONAL)
                .with(Description, Card::OPTIONAL)
                .with(Reference, Card::OPTIONAL)
                .data_def(Card::ANY),
        );
        rules.insert(
            Uses,
            Rules::default()
                .with(When, Card::OPTIONAL)
                .with(IfFeature, Card::ANY)
                .with(Status, Card::OPTIONAL)
                .with(Description, Card::OPTIONAL)
                .with(Reference, Card::OPTIONAL)
                .with(Refine, Card::ANY)
                .with(Augment, Card::ANY),
        );
        rules.insert(
            Augment,
            Rules::default()
                .with(When, Card::OPTIONAL)
                .with(IfFeature, Card::ANY)
                .with(Status, Card::OPTIONAL)
                .with(Description, Card::OPTIONAL)
                .with(Reference, Card::OPTIONAL)
                .with(Case, Card::ANY)
                .data_def(Card::ANY),
        );
        rules.insert(
            Rpc,
            Rules::default()
                .with(IfFeature, Card::ANY)
                .with(Status, Card::OPTIONAL)
                .with(Description, Card::OPTIONAL)
                .with(Reference, Card::OPTIONAL)
                .with(Typedef, Card::ANY)
                .with(Grouping, Card::ANY)
                .with(Input, Card::OPTIONAL)
                .with(Output, Card::OPTIONAL),
        );
        rules.insert(
            Notification,
            Rules::default()
                .with(IfFeature, Card::ANY)
                .with(Status, Card::OPTIONAL)
                .with(Description, Card::OPTIONAL)
                .with(Reference, Card::OPTIONAL)
                .with(Typedef, Card::ANY)
                .with(Grouping, Card::ANY)
                .data_def(Card::ANY),
        );
        rules.insert(
            Deviation,
            Rules::default()
                .with(Description, Card::OPTIONAL)
                .with(Reference, Card::OPTIONAL)
                .with(DeviateVerb, Card::AT_LEAST_ONE),
        );
        rules.insert(
            OpdCommand,
            Rules::default()
                .with(OpdHelp, Card::OPTIONAL)
                .with(OpdPrivileged, Card::OPTIONAL)
                .with(OpdLocal, Card::OPTIONAL)
                .with(OpdInternal, Card::OPTIONAL)
                .with(OpdOnEnter, Card::OPTIONAL)
                .with(OpdOnExit, Card::OPTIONAL)
                .with(OpdPassOpcArgs, Card::OPTIONAL)
                .with(OpdArgument, Card::ANY)
                .with(OpdOption, Card::ANY)
                .data_def(Card::ANY),
        );
        rules.insert(
            OpdArgument,
            Rules::default()
                .with(Type, Card::REQUIRED)
                .with(OpdHelp, Card::OPTIONAL)
                .with(OpdPattern, Card::OPTIONAL)
                .with(OpdProvideHelp, Card::OPTIONAL),
        );
        rules.insert(
            OpdOption,
            Rules::default()
                .with(OpdHelp, Card::OPTIONAL)
                .with(OpdOptionValue, Card::OPTIONAL)
                .with(Mandatory, Card::OPTIONAL),
        );

        for (host, sub, card) in extensions {
            rules.entry(*host).or_default().entries.push((*sub, *card));
        }

        Self { rules }
    }

    pub fn rules_for(&self, kind: StatementKind) -> Option<&Rules> {
        self.rules.get(&kind)
    }

    /// Count children by kind and verify every rule for `host`'s
    /// substatements is satisfied. `refine`/`deviate` bodies are
    /// exempted: the compiler enforces their shape post-hoc per
    /// `spec.md` §3 Invariants.
    pub fn check(
        &self,
        host: StatementKind,
        children: &[StatementKind],
    ) -> Result<(), Vec<(StatementKind, &'static str)>> {
        if matches!(host, StatementKind::Refine | StatementKind::DeviateVerb) {
            return Ok(());
        }
        let Some(rules) = self.rules_for(host) else {
            return Ok(());
        };
        let mut violations = Vec::new();
        let mut counts: FxHashMap<StatementKind, u32> = FxHashMap::default();
        for &k in children {
            *counts.entry(k).or_insert(0) += 1;
        }
        for (kind, card) in &rules.entries {
            let n = counts.get(kind).copied().unwrap_or(0);
            if matches!(card.start, Bound::One) && n == 0 {
                violations.push((*kind, "required substatement missing"));
            }
            if matches!(card.end, Bound::One) && n > 1 {
                violations.push((*kind, "at most one instance allowed"));
            }
        }
        if let Some(card) = rules.data_def_card() {
            let n: u32 = children.iter().filter(|k| k.is_data_def()).count() as u32;
            if matches!(card.start, Bound::One) && n == 0 {
                violations.push((DATA_DEF, "at least one data-defining child required"));
            }
        }
        for &k in children {
            let known = rules.card_for(k).is_some()
                || (k.is_data_def() && rules.data_def_card().is_some());
            if !known && !matches!(k, StatementKind::Extension) {
                violations.push((k, "unrecognised substatement for this host"));
            }
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `spec.md` §8 invariant 2: checking the same host/children shape
    /// twice against the same table produces the same verdict.
    #[test]
    fn check_is_deterministic_across_repeated_invocations() {
        let table = CardinalityTable::build(&[]);
        let children = [StatementKind::Type, StatementKind::Default, StatementKind::Description];
        let first = table.check(StatementKind::Leaf, &children);
        let second = table.check(StatementKind::Leaf, &children);
        assert_eq!(first, second);

        let bad_children = [StatementKind::Default, StatementKind::Default];
        let first_bad = table.check(StatementKind::Leaf, &bad_children);
        let second_bad = table.check(StatementKind::Leaf, &bad_children);
        assert_eq!(first_bad, second_bad);
        assert!(first_bad.is_err());
    }
}

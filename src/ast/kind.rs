//! Statement-kind vocabulary and the keyword table that resolves raw
//! identifier tokens to a [`StatementKind`].
//!
//! Unrecognised identifiers (prefixed extension statements, or bare
//! names from an unregistered extension module) fall back to
//! [`StatementKind::Extension`] rather than failing the parse — YANG
//! tooling must tolerate extensions it doesn't understand.

use rustc_hash::FxHashMap;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Module,
    Submodule,
    YangVersion,
    Namespace,
    Prefix,
    BelongsTo,
    Import,
    Include,
    RevisionDate,
    Organization,
    Contact,
    Description,
    Reference,
    Revision,
    Extension,
    Argument,
    YinElement,
    Identity,
    Base,
    Feature,
    IfFeature,
    Typedef,
    Type,
    Units,
    Default,
    Status,
    Container,
    Presence,
    Leaf,
    LeafList,
    MinElements,
    MaxElements,
    OrderedBy,
    List,
    Key,
    Unique,
    Choice,
    Case,
    Mandatory,
    Anyxml,
    Anydata,
    Grouping,
    Uses,
    Refine,
    Augment,
    When,
    Rpc,
    Input,
    Output,
    Notification,
    Deviation,
    DeviateVerb,
    Range,
    Length,
    Pattern,
    FractionDigits,
    Enum,
    Value,
    Bit,
    Position,
    Path,
    RequireInstance,
    Must,
    Config,
    ErrorMessage,
    ErrorAppTag,
    ModifierInvertMatch,
    OpdCommand,
    OpdArgument,
    OpdOption,
    OpdOptionValue,
    OpdHelp,
    OpdPrivileged,
    OpdLocal,
    OpdInternal,
    OpdOnEnter,
    OpdOnExit,
    OpdPattern,
    OpdProvideHelp,
    OpdPassOpcArgs,
    ConfigdGetState,
    ConfigdSetHook,
    ConfigdValidate,
    ConfigdHelp,
    ConfigdPriority,
    ConfigdSyntax,
    ConfigdAllowed,
    ConfigdSecret,
    /// An unrecognised statement, resolved by raw keyword text.
    Extension,
}

fn keyword_table() -> &'static FxHashMap<&'static str, StatementKind> {
    static TABLE: OnceLock<FxHashMap<&'static str, StatementKind>> = OnceLock::new();
    TABLE.get_or_init(|| {
        use StatementKind::*;
        let mut m = FxHashMap::default();
        m.insert("module", Module);
        m.insert("submodule", Submodule);
        m.insert("yang-version", YangVersion);
        m.insert("namespace", Namespace);
        m.insert("prefix", Prefix);
        m.insert("belongs-to", BelongsTo);
        m.insert("import", Import);
        m.insert("include", Include);
        m.insert("revision-date", RevisionDate);
        m.insert("organization", Organization);
        m.insert("contact", Contact);
        m.insert("description", Description);
        m.insert("reference", Reference);
        m.insert("revision", Revision);
        m.insert("extension", Extension);
        m.insert("argument", Argument);
        m.insert("yin-element", YinElement);
        m.insert("identity", Identity);
        m.insert("base", Base);
        m.insert("feature", Feature);
        m.insert("if-feature", IfFeature);
        m.insert("typedef", Typedef);
        m.insert("type", Type);
        m.insert("units", Units);
        m.insert("default", Default);
        m.insert("status", Status);
        m.insert("container", Container);
        m.insert("presence", Presence);
        m.insert("leaf", Leaf);
        m.insert("leaf-list", LeafList);
        m.insert("min-elements", MinElements);
        m.insert("max-elements", MaxElements);
        m.insert("ordered-by", OrderedBy);
        m.insert("list", List);
        m.insert("key", Key);
        m.insert("unique", Unique);
        m.insert("choice", Choice);
        m.insert("case", Case);
        m.insert("mandatory", Mandatory);
        m.insert("anyxml", Anyxml);
        m.insert("anydata", Anydata);
        m.insert("grouping", Grouping);
        m.insert("uses", Uses);
        m.insert("refine", Refine);
        m.insert("augment", Augment);
        m.insert("when", When);
        m.insert("rpc", Rpc);
        m.insert("input", Input);
        m.insert("output", Output);
        m.insert("notification", Notification);
        m.insert("deviation", Deviation);
        m.insert("deviate", DeviateVerb);
        m.insert("range", Range);
        m.insert("length", Length);
        m.insert("pattern", Pattern);
        m.insert("fraction-digits", FractionDigits);
        m.insert("enum", Enum);
        m.insert("value", Value);
        m.insert("bit", Bit);
        m.insert("position", Position);
        m.insert("path", Path);
        m.insert("require-instance", RequireInstance);
        m.insert("must", Must);
        m.insert("config", Config);
        m.insert("error-message", ErrorMessage);
        m.insert("error-app-tag", ErrorAppTag);
        m.insert("modifier", ModifierInvertMatch);
        m.insert("opd:command", OpdCommand);
        m.insert("opd:argument", OpdArgument);
        m.insert("opd:option", OpdOption);
        m.insert("opd:option-value", OpdOptionValue);
        m.insert("opd:help", OpdHelp);
        m.insert("opd:privileged", OpdPrivileged);
        m.insert("opd:local", OpdLocal);
        m.insert("opd:internal", OpdInternal);
        m.insert("opd:on-enter", OpdOnEnter);
        m.insert("opd:on-exit", OpdOnExit);
        m.insert("opd:pattern", OpdPattern);
        m.insert("opd:provide-help", OpdProvideHelp);
        m.insert("opd:pass-opc-args", OpdPassOpcArgs);
        m.insert("configd:get-state", ConfigdGetState);
        m.insert("configd:set-hook", ConfigdSetHook);
        m.insert("configd:validate", ConfigdValidate);
        m.insert("configd:help", ConfigdHelp);
        m.insert("configd:priority", ConfigdPriority);
        m.insert("configd:syntax", ConfigdSyntax);
        m.insert("configd:allowed", ConfigdAllowed);
        m.insert("configd:secret", ConfigdSecret);
        m
    })
}

/// Resolve a raw keyword to a statement kind, falling back to
/// [`StatementKind::Extension`] for anything not in the fixed table.
pub fn resolve_keyword(raw: &str) -> StatementKind {
    keyword_table().get(raw).copied().unwrap_or(StatementKind::Extension)
}

impl StatementKind {
    pub fn is_data_def(self) -> bool {
        matches!(
            self,
            StatementKind::Container
                | StatementKind::Leaf
                | StatementKind::LeafList
                | StatementKind::List
                | StatementKind::Choice
                | StatementKind::Uses
                | StatementKind::Anyxml
                | StatementKind::Anydata
        )
    }
}

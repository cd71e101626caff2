//! Static attribute tables and rule sets, one per node kind.

use crate::{AttributeSpec, NodeKind, NodeRule, ValueKind};

/// Editor-name of the attribute holding an element's inline text.
pub const CONTENT_ATTRIBUTE: &str = "#text";

pub const CONDITION_OPERATORS: &[&str] = &[
    "eq",
    "ne",
    "gt",
    "ge",
    "lt",
    "le",
    "like",
    "not-like",
    "begins-with",
    "not-begin-with",
    "ends-with",
    "not-end-with",
    "in",
    "not-in",
    "between",
    "not-between",
    "null",
    "not-null",
    "yesterday",
    "today",
    "tomorrow",
    "last-x-days",
    "next-x-days",
    "on",
    "on-or-before",
    "on-or-after",
    "eq-userid",
    "ne-userid",
    "under",
    "eq-or-under",
    "not-under",
    "above",
    "eq-or-above",
    "contain-values",
    "not-contain-values",
];

const LINK_TYPES: &[&str] = &[
    "inner",
    "outer",
    "any",
    "not any",
    "all",
    "not all",
    "exists",
    "in",
    "matchfirstrowusingcrossapply",
];

const FILTER_TYPES: &[&str] = &["and", "or"];

const DATE_GROUPINGS: &[&str] = &[
    "day",
    "week",
    "month",
    "quarter",
    "year",
    "fiscal-period",
    "fiscal-year",
];

const fn attr(name: &'static str, order: u32, value_kind: ValueKind) -> AttributeSpec {
    AttributeSpec {
        name,
        order,
        value_kind,
        displayable: false,
        content: false,
    }
}

const fn shown(name: &'static str, order: u32, value_kind: ValueKind) -> AttributeSpec {
    AttributeSpec {
        name,
        order,
        value_kind,
        displayable: true,
        content: false,
    }
}

use ValueKind::{Bool, Choice, Number, Text};

static FETCH: &[AttributeSpec] = &[
    attr("version", 1, Text),
    attr("output-format", 2, Text),
    attr("mapping", 3, Choice(&["logical", "internal"])),
    shown("top", 4, Number),
    attr("count", 5, Number),
    attr("page", 6, Number),
    attr("paging-cookie", 7, Text),
    shown("distinct", 8, Bool),
    attr("no-lock", 9, Bool),
    shown("aggregate", 10, Bool),
    attr("returntotalrecordcount", 11, Bool),
];

static ENTITY: &[AttributeSpec] = &[
    shown("name", 1, Text),
    attr("enableprefiltering", 2, Bool),
];

static LINK_ENTITY: &[AttributeSpec] = &[
    shown("name", 1, Text),
    shown("from", 2, Text),
    shown("to", 3, Text),
    shown("alias", 4, Text),
    shown("link-type", 5, Choice(LINK_TYPES)),
    attr("visible", 6, Bool),
    attr("intersect", 7, Bool),
];

static ATTRIBUTE: &[AttributeSpec] = &[
    shown("name", 1, Text),
    shown("alias", 2, Text),
    shown("aggregate", 3, Text),
    attr("groupby", 4, Bool),
    attr("dategrouping", 5, Choice(DATE_GROUPINGS)),
    attr("distinct", 6, Bool),
    attr("usertimezone", 7, Bool),
];

static ORDER: &[AttributeSpec] = &[
    shown("attribute", 1, Text),
    shown("alias", 2, Text),
    shown("descending", 3, Bool),
    attr("entityname", 4, Text),
];

static FILTER: &[AttributeSpec] = &[
    shown("type", 1, Choice(FILTER_TYPES)),
    attr("isquickfindfields", 2, Bool),
];

static CONDITION: &[AttributeSpec] = &[
    shown("entityname", 1, Text),
    shown("attribute", 2, Text),
    shown("operator", 3, Choice(CONDITION_OPERATORS)),
    shown("value", 4, Text),
    attr("alias", 5, Text),
    attr("uiname", 6, Text),
    attr("uitype", 7, Text),
    attr("uihidden", 8, Bool),
];

static VALUE: &[AttributeSpec] = &[
    AttributeSpec {
        name: CONTENT_ATTRIBUTE,
        order: 0,
        value_kind: Text,
        displayable: true,
        content: true,
    },
    attr("uiname", 1, Text),
    attr("uitype", 2, Text),
];

pub(crate) fn table(kind: NodeKind) -> &'static [AttributeSpec] {
    match kind {
        NodeKind::Fetch => FETCH,
        NodeKind::Entity => ENTITY,
        NodeKind::LinkEntity => LINK_ENTITY,
        NodeKind::Attribute => ATTRIBUTE,
        NodeKind::Order => ORDER,
        NodeKind::Filter => FILTER,
        NodeKind::Condition => CONDITION,
        NodeKind::Value => VALUE,
        NodeKind::AllAttributes | NodeKind::Unknown => &[],
    }
}

pub(crate) fn rules(kind: NodeKind) -> &'static [NodeRule] {
    match kind {
        NodeKind::Entity => &[NodeRule::RequireAttribute("name")],
        NodeKind::LinkEntity => &[
            NodeRule::RequireAttribute("name"),
            NodeRule::RequireAttribute("from"),
            NodeRule::RequireAttribute("to"),
        ],
        NodeKind::Attribute => &[
            NodeRule::RequireAttribute("name"),
            NodeRule::AliasWhenAggregated,
        ],
        NodeKind::Order => &[NodeRule::RequireAnyOf(&["attribute", "alias"])],
        NodeKind::Filter => &[NodeRule::RequireChild],
        NodeKind::Condition => &[
            NodeRule::RequireAttribute("attribute"),
            NodeRule::RequireAttribute("operator"),
        ],
        NodeKind::Fetch | NodeKind::AllAttributes | NodeKind::Value | NodeKind::Unknown => &[],
    }
}

//! Vendor prefixing and declaration sorting on the CSS tree.

use crate::css::{Declaration, Item, OutputStyle, parse_asset};
use aflow_kernel::prelude::{Asset, Step, StepError};

/// Properties that still need vendor prefixes for the supported browsers.
const PREFIXED_PROPERTIES: &[(&str, &[&str])] = &[
    ("appearance", &["-webkit-", "-moz-"]),
    ("backdrop-filter", &["-webkit-"]),
    ("box-decoration-break", &["-webkit-"]),
    ("hyphens", &["-webkit-"]),
    ("mask", &["-webkit-"]),
    ("mask-image", &["-webkit-"]),
    ("mask-position", &["-webkit-"]),
    ("mask-repeat", &["-webkit-"]),
    ("mask-size", &["-webkit-"]),
    ("text-size-adjust", &["-webkit-"]),
    ("user-select", &["-webkit-"]),
];

/// Values that need a prefixed twin: `(property, value, prefixed value)`.
const PREFIXED_VALUES: &[(&str, &str, &str)] = &[("position", "sticky", "-webkit-sticky")];

const VENDOR_PREFIXES: &[&str] = &["-webkit-", "-moz-", "-ms-", "-o-"];

/// Vendor prefixing followed by declaration sorting; writes expanded CSS.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostCss;

impl Step for PostCss {
    fn name(&self) -> &'static str {
        "postcss"
    }

    fn apply(&self, mut asset: Asset) -> Result<Asset, StepError> {
        let mut sheet = parse_asset(&asset)?;
        prefix(&mut sheet.items);
        sort(&mut sheet.items);
        asset.set_text(sheet.to_css(OutputStyle::Expanded));
        Ok(asset)
    }
}

/// Inserts prefixed declarations before their standard counterpart, unless
/// the block already declares them.
pub fn prefix(items: &mut Vec<Item>) {
    let existing: Vec<(String, String)> = items
        .iter()
        .filter_map(|item| match item {
            Item::Declaration(d) => Some((d.property.to_ascii_lowercase(), d.value.to_ascii_lowercase())),
            _ => None,
        })
        .collect();
    let declared = |property: &str, value: Option<&str>| {
        existing.iter().any(|(p, v)| p == property && value.is_none_or(|value| v == value))
    };

    let mut out = Vec::with_capacity(items.len());
    for mut item in items.drain(..) {
        match &mut item {
            Item::Declaration(d) => {
                let property = d.property.to_ascii_lowercase();
                if let Some((_, prefixes)) = PREFIXED_PROPERTIES.iter().find(|(p, _)| *p == property) {
                    for vendor in *prefixes {
                        let name = format!("{vendor}{property}");
                        if !declared(&name, None) {
                            out.push(Item::Declaration(Declaration { property: name, ..d.clone() }));
                        }
                    }
                }
                let value = d.value.to_ascii_lowercase();
                for &(p, v, prefixed) in PREFIXED_VALUES {
                    if p == property && v == value && !declared(p, Some(prefixed)) {
                        out.push(Item::Declaration(Declaration { value: prefixed.to_owned(), ..d.clone() }));
                    }
                }
            },
            Item::Rule(rule) => prefix(&mut rule.items),
            Item::AtRule(at) => {
                if let Some(items) = at.items.as_mut() {
                    prefix(items);
                }
            },
            Item::Comment(_) => {},
        }
        out.push(item);
    }
    *items = out;
}

/// Sorts each run of consecutive declarations alphabetically by unprefixed
/// property, prefixed variants first. Comments and nested blocks stay put
/// and split runs. Custom properties keep their source order at the front.
pub fn sort(items: &mut [Item]) {
    let mut start = 0;
    while start < items.len() {
        let end = items[start..]
            .iter()
            .position(|item| !matches!(item, Item::Declaration(_)))
            .map_or(items.len(), |offset| start + offset);
        items[start..end].sort_by_cached_key(sort_key);

        if let Some(item) = items.get_mut(end) {
            match item {
                Item::Rule(rule) => sort(&mut rule.items),
                Item::AtRule(at) => {
                    if let Some(nested) = at.items.as_mut() {
                        sort(nested);
                    }
                },
                _ => {},
            }
        }
        start = end + 1;
    }
}

fn sort_key(item: &Item) -> (u8, String, u8) {
    let Item::Declaration(d) = item else {
        return (0, String::new(), 0);
    };
    let property = d.property.to_ascii_lowercase();
    if property.starts_with("--") {
        return (0, String::new(), 0);
    }
    match VENDOR_PREFIXES.iter().find_map(|vendor| property.strip_prefix(vendor)) {
        Some(bare) => (1, bare.to_owned(), 0),
        None => (1, property, 1),
    }
}

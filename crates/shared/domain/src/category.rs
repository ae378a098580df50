use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Asset categories known to the pipeline. Each owns exactly one registry entry and one task.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    Style,
    Script,
    Template,
    Image,
}

impl Category {
    pub const ALL: [Self; 4] = [Self::Style, Self::Script, Self::Template, Self::Image];

    /// Stable position in [`Category::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Style => 0,
            Self::Script => 1,
            Self::Template => 2,
            Self::Image => 3,
        }
    }

    /// The historical task name users invoke on the command line.
    #[must_use]
    pub const fn task_name(self) -> &'static str {
        match self {
            Self::Style => "compileSass",
            Self::Script => "minJs",
            Self::Template => "compilePug",
            Self::Image => "minImages",
        }
    }

    /// Whether a watch-triggered rebuild is followed by a browser reload.
    #[must_use]
    pub const fn reloads_after_rebuild(self) -> bool {
        !matches!(self, Self::Image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_index_matches_all_order() {
        for (i, category) in Category::iter().enumerate() {
            assert_eq!(category.index(), i);
            assert_eq!(Category::ALL[i], category);
        }
    }

    #[test]
    fn test_only_images_skip_reload() {
        let silent: Vec<_> = Category::ALL.into_iter().filter(|c| !c.reloads_after_rebuild()).collect();
        assert_eq!(silent, vec![Category::Image]);
    }
}

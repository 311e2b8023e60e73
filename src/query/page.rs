use crate::config::{Settings, DEFAULT_PAGE_SIZE};
use serde::{Deserialize, Serialize};

/// A window over an id-ordered result set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Default for Page {
    fn default() -> Self {
        Page {
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl Page {
    /// Requested window with the default applied and the limit clamped to `max`.
    pub fn clamped(limit: Option<u32>, offset: Option<u32>, default: u32, max: u32) -> Self {
        Page {
            limit: limit.unwrap_or(default).min(max),
            offset: offset.unwrap_or(0),
        }
    }

    pub fn from_settings(limit: Option<u32>, offset: Option<u32>, settings: &Settings) -> Self {
        Self::clamped(limit, offset, settings.default_page_size, settings.max_page_size)
    }

    pub fn skip(&self) -> usize {
        self.offset as usize
    }

    pub fn take(&self) -> usize {
        self.limit as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, None, Page { limit: 100, offset: 0 })]
    #[case(Some(10), Some(20), Page { limit: 10, offset: 20 })]
    #[case(Some(5000), None, Page { limit: 1000, offset: 0 })]
    #[case(Some(0), None, Page { limit: 0, offset: 0 })]
    fn clamping(#[case] limit: Option<u32>, #[case] offset: Option<u32>, #[case] expected: Page) {
        assert_eq!(Page::from_settings(limit, offset, &Settings::default()), expected);
    }
}

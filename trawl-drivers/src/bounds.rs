use std::fmt;
use std::str::FromStr;

use trawl_common::TrawlError;

/// On-screen rectangle of an element as reported by UiAutomator2's
/// `bounds` attribute (`[left,top][right,bottom]`).
///
/// Only comparable within one page of content: after a scroll the same row
/// reports different bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> (i32, i32) {
        (
            self.left + self.width() / 2,
            self.top + self.height() / 2,
        )
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{},{}][{},{}]",
            self.left, self.top, self.right, self.bottom
        )
    }
}

impl FromStr for Bounds {
    type Err = TrawlError;

    /// ```
    /// use trawl_drivers::Bounds;
    ///
    /// let b: Bounds = "[0,210][540,980]".parse().unwrap();
    /// assert_eq!(b, Bounds::new(0, 210, 540, 980));
    /// assert_eq!(b.center(), (270, 595));
    /// ```
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || TrawlError::InvalidBounds(raw.to_string());

        let inner = raw
            .trim()
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .ok_or_else(invalid)?;
        let (first, second) = inner.split_once("][").ok_or_else(invalid)?;

        let pair = |s: &str| -> Result<(i32, i32), TrawlError> {
            let (a, b) = s.split_once(',').ok_or_else(invalid)?;
            let a = a.trim().parse().map_err(|_| invalid())?;
            let b = b.trim().parse().map_err(|_| invalid())?;
            Ok((a, b))
        };

        let (left, top) = pair(first)?;
        let (right, bottom) = pair(second)?;
        Ok(Bounds::new(left, top, right, bottom))
    }
}

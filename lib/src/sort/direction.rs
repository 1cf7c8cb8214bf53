use crate::config::Settings;

/// The direction a column is currently sorted in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Direction {
    Asc,
    Desc,
    /// No recognized `dir` parameter. Sorts like `Desc`.
    #[default]
    Unset,
}

impl Direction {
    /// Parses the value of a `dir` query parameter. Anything other than `asc`
    /// or `desc`, including a missing parameter, is `Unset`.
    pub fn parse(value: Option<&str>) -> Direction {
        match value {
            Some("asc") => Direction::Asc,
            Some("desc") => Direction::Desc,
            _ => Direction::Unset,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
            Direction::Unset => "",
        }
    }

    /// The direction the next click on the active column should sort in.
    ///
    /// ```rust
    /// use sorting::sort::Direction;
    ///
    /// assert_eq!(Direction::Unset.inverse(), Direction::Asc);
    /// assert_eq!(Direction::Asc.inverse(), Direction::Desc);
    /// assert_eq!(Direction::Desc.inverse(), Direction::Asc);
    /// ```
    pub fn inverse(self) -> Direction {
        match self {
            Direction::Asc => Direction::Desc,
            Direction::Desc | Direction::Unset => Direction::Asc,
        }
    }

    /// The icon shown next to the title of the active column.
    pub fn icon(self, settings: &Settings) -> &str {
        match self {
            Direction::Asc => &settings.sort_up,
            Direction::Desc | Direction::Unset => &settings.sort_down,
        }
    }

    pub fn is_descending(self) -> bool {
        !matches!(self, Direction::Asc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_table() {
        let settings = Settings::default();
        let table = [
            (None, "&darr;", "asc"),
            (Some(""), "&darr;", "asc"),
            (Some("asc"), "&uarr;", "desc"),
            (Some("desc"), "&darr;", "asc"),
        ];

        for (dir, icon, inverse) in table {
            let direction = Direction::parse(dir);
            assert_eq!(direction.icon(&settings), icon, "{dir:?}");
            assert_eq!(direction.inverse().as_str(), inverse, "{dir:?}");
        }
    }

    #[test]
    fn icons_follow_settings() {
        let settings = Settings { sort_up: "^".into(), sort_down: "v".into(), ..Settings::default() };
        assert_eq!(Direction::Asc.icon(&settings), "^");
        assert_eq!(Direction::Unset.icon(&settings), "v");
    }
}

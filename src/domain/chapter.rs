use uuid::Uuid;

/// How far the user got with a chapter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UserStatus {
    #[default]
    None,
    Reading,
    Done,
}

impl UserStatus {
    /// Position used in the persisted record (0/1/2).
    pub fn ordinal(self) -> u8 {
        match self {
            UserStatus::None => 0,
            UserStatus::Reading => 1,
            UserStatus::Done => 2,
        }
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            0 => Some(UserStatus::None),
            1 => Some(UserStatus::Reading),
            2 => Some(UserStatus::Done),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub id: Uuid,
    pub series_id: Uuid,
    pub name: String,
    pub number: f64,
    /// Page images, front to back. Empty until materialised.
    pub panes: Vec<Pane>,
    pub info_page: String,
    pub user_status: UserStatus,
    /// 0-based index of the current page.
    pub last_page: usize,
}

impl Chapter {
    pub fn new(series_id: Uuid, name: &str, number: f64, info_page: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            series_id,
            name: name.to_string(),
            number,
            panes: Vec::new(),
            info_page: info_page.to_string(),
            user_status: UserStatus::None,
            last_page: 0,
        }
    }

    pub fn set_id(&mut self, id: Uuid) {
        self.id = id;
        for pane in &mut self.panes {
            pane.chapter_id = id;
        }
    }

    pub fn add_pane(&mut self, url: &str) {
        self.panes.push(Pane {
            url: url.to_string(),
            chapter_id: self.id,
        });
    }

    /// Take a fetched pane list, keeping `last_page` inside it.
    pub fn set_panes(&mut self, panes: Vec<Pane>) {
        self.panes = panes;
        for pane in &mut self.panes {
            pane.chapter_id = self.id;
        }
        self.last_page = self.last_page.min(self.panes.len().saturating_sub(1));
    }

    pub fn current_pane(&self) -> Option<&Pane> {
        self.panes.get(self.last_page)
    }

    pub fn is_last_page(&self) -> bool {
        !self.panes.is_empty() && self.last_page + 1 >= self.panes.len()
    }

    /// Text shown in the reader's progress status, e.g. `12 / 40`.
    pub fn progress_label(&self) -> String {
        format!("{} / {}", self.last_page + 1, self.panes.len())
    }
}

/// A single page image. Identity is the URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pane {
    pub url: String,
    pub chapter_id: Uuid,
}

/// Extract the chapter number from a display name such as `Chapter 10.5`.
///
/// Takes the first run of digits and dots that parses as a number and
/// falls back to `0.0`.
pub fn parse_chapter_number(name: &str) -> f64 {
    let mut run = String::new();
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_ascii_digit() || c == '.' {
            run.push(c);
            let ends = chars
                .peek()
                .is_none_or(|next| !(next.is_ascii_digit() || *next == '.'));
            if ends {
                let candidate = run.trim_matches('.');
                if let Ok(number) = candidate.parse::<f64>() {
                    return number;
                }
                run.clear();
            }
        }
    }
    0.0
}

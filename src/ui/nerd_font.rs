/// Custom NerdFont enum with carefully selected icons for cursor-setup
///
/// A curated set of icons that are:
/// - Semantically appropriate for their usage
/// - Consistent in style
/// - Well-supported across nerd font implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NerdFont {
    // Status and feedback
    Check,          //
    Cross,          //
    Warning,        //
    Info,           //

    // Files and folders
    Download,       //
    Archive,        //

    // System and hardware
    Desktop,        //
    Terminal,       //
    Gear,           //
    Wrench,         //
    Lock,           //

    // Actions and controls
    Trash,          //
    Search,         //

    // Development and tools
    Package,        //

    // Miscellaneous
    Rocket,         //
}

impl NerdFont {
    /// Get the Unicode character for this nerd font icon
    pub const fn unicode(&self) -> char {
        match self {
            // Status and feedback
            Self::Check => '\u{f00c}',          // fa-check
            Self::Cross => '\u{f00d}',          // fa-times
            Self::Warning => '\u{f071}',        // fa-exclamation-triangle
            Self::Info => '\u{f05a}',           // fa-info-circle

            // Files and folders
            Self::Download => '\u{f019}',       // fa-download
            Self::Archive => '\u{f187}',        // fa-archive

            // System and hardware
            Self::Desktop => '\u{f108}',        // fa-desktop
            Self::Terminal => '\u{f120}',       // fa-terminal
            Self::Gear => '\u{f013}',           // fa-gear
            Self::Wrench => '\u{f0ad}',         // fa-wrench
            Self::Lock => '\u{f023}',           // fa-lock

            // Actions and controls
            Self::Trash => '\u{f1f8}',          // fa-trash
            Self::Search => '\u{f002}',         // fa-search

            // Development and tools
            Self::Package => '\u{f187}',        // fa-archive (reused)

            // Miscellaneous
            Self::Rocket => '\u{f135}',         // fa-rocket
        }
    }
}

impl std::fmt::Display for NerdFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.unicode())
    }
}

impl From<NerdFont> for char {
    fn from(icon: NerdFont) -> Self {
        icon.unicode()
    }
}

impl From<NerdFont> for String {
    fn from(icon: NerdFont) -> Self {
        icon.unicode().to_string()
    }
}

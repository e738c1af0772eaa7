//! Catalog domain types.
//!
//! These are the core-owned shapes of what the storefront reports about a
//! user's library. API wire formats live in the client crate and are mapped
//! into these types at the port boundary.

use std::fmt;

/// Opaque identifier for one owned title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CatalogItem(pub u64);

impl CatalogItem {
    /// Numeric value as reported by the storefront.
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CatalogItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CatalogItem {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Kind of media to enumerate from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaType {
    /// Games (the default).
    #[default]
    Game,
    /// Movies.
    Movie,
}

impl MediaType {
    /// Numeric value used by the storefront API.
    pub const fn wire_value(self) -> u8 {
        match self {
            Self::Game => 1,
            Self::Movie => 2,
        }
    }
}

/// One page of catalog results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogPage {
    /// Items on this page.
    pub items: Vec<CatalogItem>,
    /// Total page count as reported by this response.
    ///
    /// The remote may revise this between pages.
    pub total_pages: u32,
}

impl CatalogPage {
    /// Create a page from its items and the reported page count.
    pub fn new(items: impl IntoIterator<Item = CatalogItem>, total_pages: u32) -> Self {
        Self {
            items: items.into_iter().collect(),
            total_pages,
        }
    }
}

/// Installer platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    Mac,
    Linux,
}

impl Platform {
    /// All platforms in emission order.
    pub const ALL: [Self; 3] = [Self::Windows, Self::Mac, Self::Linux];

    /// Directory segment used in the backup layout.
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Windows => "Windows",
            Self::Mac => "Mac",
            Self::Linux => "Linux",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Directory segment for bonus content.
pub const EXTRAS_DIR: &str = "Extras";

/// A single downloadable file.
///
/// This may be an installer, one part of a split installer, or an extra.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameFile {
    /// Display name.
    pub name: String,
    /// Absolute source URL.
    pub url: String,
    /// Version string, if the storefront reports one.
    pub version: Option<String>,
    /// Human-readable size label (e.g. "6 MB").
    pub size: String,
}

/// Installer files per platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformFiles {
    pub windows: Vec<GameFile>,
    pub mac: Vec<GameFile>,
    pub linux: Vec<GameFile>,
}

impl PlatformFiles {
    /// Files for one platform.
    pub fn for_platform(&self, platform: Platform) -> &[GameFile] {
        match platform {
            Platform::Windows => &self.windows,
            Platform::Mac => &self.mac,
            Platform::Linux => &self.linux,
        }
    }

    /// Iterate `(platform, file)` pairs in emission order.
    pub fn iter(&self) -> impl Iterator<Item = (Platform, &GameFile)> {
        Platform::ALL
            .into_iter()
            .flat_map(move |p| self.for_platform(p).iter().map(move |f| (p, f)))
    }
}

/// Installers for one language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageDownloads {
    pub language: String,
    pub platforms: PlatformFiles,
}

/// Detail blob for an owned title or a bundled DLC.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameDetails {
    /// Title as displayed by the storefront.
    pub title: String,
    /// Installer sets, one per language. Only the first is backed up.
    pub downloads: Vec<LanguageDownloads>,
    /// Bonus content.
    pub extras: Vec<GameFile>,
    /// Nested bundled content.
    pub dlcs: Vec<Self>,
}

impl GameDetails {
    /// Installer set that gets backed up (the first language entry).
    pub fn primary_downloads(&self) -> Option<&PlatformFiles> {
        self.downloads.first().map(|d| &d.platforms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> GameFile {
        GameFile {
            name: name.to_string(),
            ..GameFile::default()
        }
    }

    #[test]
    fn media_type_wire_values() {
        assert_eq!(MediaType::Game.wire_value(), 1);
        assert_eq!(MediaType::Movie.wire_value(), 2);
        assert_eq!(MediaType::default(), MediaType::Game);
    }

    #[test]
    fn platform_files_iterate_in_platform_order() {
        let files = PlatformFiles {
            windows: vec![file("setup.exe"), file("setup-1.bin")],
            mac: vec![file("game.pkg")],
            linux: vec![file("game.sh")],
        };

        let order: Vec<_> = files
            .iter()
            .map(|(p, f)| format!("{p}:{}", f.name))
            .collect();
        assert_eq!(
            order,
            vec![
                "Windows:setup.exe",
                "Windows:setup-1.bin",
                "Mac:game.pkg",
                "Linux:game.sh"
            ]
        );
    }

    #[test]
    fn primary_downloads_uses_first_language() {
        let details = GameDetails {
            title: "Game".to_string(),
            downloads: vec![
                LanguageDownloads {
                    language: "English".to_string(),
                    platforms: PlatformFiles {
                        linux: vec![file("en.sh")],
                        ..PlatformFiles::default()
                    },
                },
                LanguageDownloads {
                    language: "Deutsch".to_string(),
                    platforms: PlatformFiles {
                        linux: vec![file("de.sh")],
                        ..PlatformFiles::default()
                    },
                },
            ],
            ..GameDetails::default()
        };

        let primary = details.primary_downloads().unwrap();
        assert_eq!(primary.linux[0].name, "en.sh");
        assert!(GameDetails::default().primary_downloads().is_none());
    }

    #[test]
    fn catalog_item_display() {
        assert_eq!(CatalogItem(1_207_658_924).to_string(), "1207658924");
        assert_eq!(CatalogItem::from(7).id(), 7);
    }
}

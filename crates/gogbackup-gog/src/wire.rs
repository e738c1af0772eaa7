//! JSON wire types for the GOG embed and auth APIs.
//!
//! These mirror the responses as GOG sends them and are converted into the
//! core domain types before leaving the crate.

use gogbackup_core::{
    CatalogItem, CatalogPage, GameDetails, GameFile, LanguageDownloads, PlatformFiles,
};
use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::Deserialize;
use std::fmt;

/// Response of the refresh-token grant.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
    /// GOG rotates refresh tokens on some grants.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// One page of `getFilteredProducts`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredProductPage {
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default, alias = "Products")]
    pub products: Vec<FilteredProduct>,
}

#[derive(Debug, Deserialize)]
pub struct FilteredProduct {
    pub id: u64,
}

impl From<FilteredProductPage> for CatalogPage {
    fn from(page: FilteredProductPage) -> Self {
        Self::new(
            page.products.into_iter().map(|p| CatalogItem(p.id)),
            page.total_pages,
        )
    }
}

/// Body of `gameDetails/<id>.json`. DLC entries share the same shape.
#[derive(Debug, Deserialize)]
pub struct GameDetailsWire {
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub downloads: Vec<LanguageEntry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub extras: Vec<GameDownloadWire>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub dlcs: Vec<GameDetailsWire>,
}

/// A `[language, {windows, mac, linux}]` tuple.
#[derive(Debug)]
pub struct LanguageEntry {
    pub language: String,
    pub platforms: PlatformsWire,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlatformsWire {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub windows: Vec<GameDownloadWire>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub mac: Vec<GameDownloadWire>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub linux: Vec<GameDownloadWire>,
}

#[derive(Debug, Deserialize)]
pub struct GameDownloadWire {
    #[serde(rename = "manualUrl", default)]
    pub manual_url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub version: Option<String>,
    #[serde(default, alias = "Size")]
    pub size: String,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Versions are usually strings but occasionally bare numbers or null.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

impl<'de> Deserialize<'de> for LanguageEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TupleVisitor;

        impl<'de> Visitor<'de> for TupleVisitor {
            type Value = LanguageEntry;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a [language, platforms] pair")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let language: String = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let platforms: Option<PlatformsWire> = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                if seq.next_element::<de::IgnoredAny>()?.is_some() {
                    return Err(de::Error::invalid_length(3, &self));
                }
                Ok(LanguageEntry {
                    language,
                    platforms: platforms.unwrap_or_default(),
                })
            }
        }

        deserializer.deserialize_seq(TupleVisitor)
    }
}

impl GameDownloadWire {
    fn into_file(self, embed_url: &str) -> GameFile {
        GameFile {
            name: self.name,
            url: format!("{embed_url}{}", self.manual_url),
            version: self.version.filter(|v| !v.is_empty()),
            size: self.size,
        }
    }
}

fn into_files(files: Vec<GameDownloadWire>, embed_url: &str) -> Vec<GameFile> {
    files.into_iter().map(|f| f.into_file(embed_url)).collect()
}

impl GameDetailsWire {
    /// Convert into the domain type, resolving download URLs against
    /// `embed_url`.
    pub fn into_details(self, embed_url: &str) -> GameDetails {
        GameDetails {
            title: self.title,
            downloads: self
                .downloads
                .into_iter()
                .map(|entry| LanguageDownloads {
                    language: entry.language,
                    platforms: PlatformFiles {
                        windows: into_files(entry.platforms.windows, embed_url),
                        mac: into_files(entry.platforms.mac, embed_url),
                        linux: into_files(entry.platforms.linux, embed_url),
                    },
                })
                .collect(),
            extras: into_files(self.extras, embed_url),
            dlcs: self
                .dlcs
                .into_iter()
                .map(|dlc| dlc.into_details(embed_url))
                .collect(),
        }
    }
}

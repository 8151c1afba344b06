//! Dataset lookup and the local cache.
//!
//! Datasets come from the anagrams server (`GET <base>/<LEXICON>/<QUERY>`)
//! and are cached verbatim in eframe storage, which is browser local storage
//! on the web. On startup the page URL decides whether to fetch a fresh
//! dataset or restore the cached one.

use crate::constants::{CACHE_KEY_JSON, CACHE_KEY_LEXICON, LOOKUP_BASE_URL};
use crate::lexicon::{normalize_query, Lexicon};
use std::fmt;
use url::Url;

/// Failure while fetching a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The lookup URL could not be built
    Url(String),
    /// The request could not be sent or no response arrived
    Network(String),
    /// The server answered with a non-success status
    Status(u16),
    /// The response body could not be read
    Body(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Url(e) => write!(f, "invalid lookup URL: {e}"),
            FetchError::Network(e) => write!(f, "request failed: {e}"),
            FetchError::Status(code) => write!(f, "server responded with status {code}"),
            FetchError::Body(e) => write!(f, "failed to read response body: {e}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Builds the lookup URL for a lexicon and an already validated query.
pub fn lookup_url(lexicon: Lexicon, query: &str) -> Result<Url, FetchError> {
    let base = Url::parse(LOOKUP_BASE_URL).map_err(|e| FetchError::Url(e.to_string()))?;
    base.join(&format!("{}/{}", lexicon.id(), query.to_ascii_uppercase()))
        .map_err(|e| FetchError::Url(e.to_string()))
}

/// Fetches the raw dataset body.
#[cfg(not(target_arch = "wasm32"))]
pub async fn fetch_dataset(url: Url) -> Result<String, FetchError> {
    log::info!("fetching {url}");
    let response = reqwest::get(url)
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }
    response.text().await.map_err(|e| FetchError::Body(e.to_string()))
}

/// Fetches the raw dataset body.
#[cfg(target_arch = "wasm32")]
pub async fn fetch_dataset(url: Url) -> Result<String, FetchError> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    log::info!("fetching {url}");
    let window = web_sys::window().ok_or_else(|| FetchError::Network("no window".into()))?;
    let response = JsFuture::from(window.fetch_with_str(url.as_str()))
        .await
        .map_err(|e| FetchError::Network(format!("{e:?}")))?
        .dyn_into::<web_sys::Response>()
        .map_err(|_| FetchError::Network("not a response".into()))?;
    if !response.ok() {
        return Err(FetchError::Status(response.status()));
    }
    let text = response.text().map_err(|e| FetchError::Body(format!("{e:?}")))?;
    JsFuture::from(text)
        .await
        .map_err(|e| FetchError::Body(format!("{e:?}")))?
        .as_string()
        .ok_or_else(|| FetchError::Body("body is not text".into()))
}

/// Lexicon and query read from the page URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupParams {
    /// Raw `lexicon` parameter
    pub lexicon: Option<String>,
    /// Raw `query` parameter
    pub query: Option<String>,
}

impl StartupParams {
    /// Extracts the `lexicon` and `query` parameters from a page URL.
    pub fn from_page_url(page_url: &str) -> Self {
        let Ok(url) = Url::parse(page_url) else {
            log::warn!("ignoring unparsable page URL {page_url}");
            return Self::default();
        };
        let mut params = Self::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "lexicon" => params.lexicon = Some(value.into_owned()),
                "query" => params.query = Some(value.into_owned()),
                _ => {}
            }
        }
        params
    }

    /// Parameters of the current browser page.
    #[cfg(target_arch = "wasm32")]
    pub fn from_location() -> Self {
        web_sys::window()
            .and_then(|w| w.location().href().ok())
            .map(|href| Self::from_page_url(&href))
            .unwrap_or_default()
    }

    /// Native builds have no page URL.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_location() -> Self {
        Self::default()
    }
}

/// What to show when the application starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupAction {
    /// Fetch a dataset for a query given in the page URL
    Fetch {
        /// Lexicon to search
        lexicon: Lexicon,
        /// Validated, uppercased query
        query: String,
    },
    /// Show the dataset cached by the previous session
    Restore {
        /// Lexicon of the cached dataset
        lexicon: Lexicon,
        /// Raw cached dataset
        json: String,
    },
    /// Nothing to show yet
    Empty {
        /// Lexicon preselected in the search form
        lexicon: Lexicon,
    },
}

impl StartupAction {
    /// Lexicon selected by this action.
    pub fn lexicon(&self) -> Lexicon {
        match self {
            StartupAction::Fetch { lexicon, .. }
            | StartupAction::Restore { lexicon, .. }
            | StartupAction::Empty { lexicon } => *lexicon,
        }
    }
}

/// Lexicon stored by the previous session.
pub fn cached_lexicon(storage: Option<&dyn eframe::Storage>) -> Option<Lexicon> {
    storage?
        .get_string(CACHE_KEY_LEXICON)
        .and_then(|id| Lexicon::from_param(&id))
}

/// Raw dataset stored by the previous session.
pub fn cached_dataset(storage: Option<&dyn eframe::Storage>) -> Option<String> {
    storage?.get_string(CACHE_KEY_JSON)
}

/// Records a successful fetch so the next session can restore it.
pub fn store_fetch(storage: &mut dyn eframe::Storage, lexicon: Lexicon, json: &str) {
    storage.set_string(CACHE_KEY_JSON, json.to_string());
    storage.set_string(CACHE_KEY_LEXICON, lexicon.id().to_string());
    storage.flush();
}

/// Decides the startup action from URL parameters and the cache.
///
/// A recognised `lexicon` parameter wins over the cached lexicon, which wins
/// over the default. A valid `query` parameter triggers a fetch; otherwise
/// the cached dataset is restored if there is one.
pub fn resolve_startup(
    params: &StartupParams,
    storage: Option<&dyn eframe::Storage>,
) -> StartupAction {
    let lexicon = params
        .lexicon
        .as_deref()
        .and_then(Lexicon::from_param)
        .or_else(|| cached_lexicon(storage))
        .unwrap_or_default();

    if let Some(query) = params.query.as_deref().and_then(normalize_query) {
        return StartupAction::Fetch { lexicon, query };
    }
    match cached_dataset(storage) {
        Some(json) => StartupAction::Restore { lexicon, json },
        None => StartupAction::Empty { lexicon },
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use eframe::Storage as _;
    use std::collections::HashMap;

    /// In-memory stand-in for browser local storage.
    #[derive(Default)]
    pub(crate) struct MemoryStorage {
        pub(crate) values: HashMap<String, String>,
        pub(crate) flushes: usize,
    }

    impl eframe::Storage for MemoryStorage {
        fn get_string(&self, key: &str) -> Option<String> {
            self.values.get(key).cloned()
        }

        fn set_string(&mut self, key: &str, value: String) {
            self.values.insert(key.to_string(), value);
        }

        fn flush(&mut self) {
            self.flushes += 1;
        }
    }

    #[test]
    fn lookup_url_uses_lexicon_and_uppercased_query() {
        let url = lookup_url(Lexicon::Csw21, "care").expect("valid url");
        assert_eq!(url.as_str(), "https://anagrams.mynetgear.com/CSW21/CARE");
    }

    #[test]
    fn page_url_parameters_are_extracted() {
        let params = StartupParams::from_page_url(
            "https://example.org/tree.html?lexicon=csw21&query=care&other=1",
        );
        assert_eq!(params.lexicon.as_deref(), Some("csw21"));
        assert_eq!(params.query.as_deref(), Some("care"));
        assert_eq!(StartupParams::from_page_url("not a url"), StartupParams::default());
    }

    #[test]
    fn valid_query_triggers_fetch() {
        let params = StartupParams {
            lexicon: Some("csw21".into()),
            query: Some("care".into()),
        };
        assert_eq!(
            resolve_startup(&params, None),
            StartupAction::Fetch {
                lexicon: Lexicon::Csw21,
                query: "CARE".into()
            }
        );
    }

    #[test]
    fn invalid_query_falls_back_to_cache() {
        let mut storage = MemoryStorage::default();
        store_fetch(&mut storage, Lexicon::Csw21, "[{\"id\":\"CARE\"}]");
        assert_eq!(storage.flushes, 1);

        let params = StartupParams {
            lexicon: None,
            query: Some("ab1".into()),
        };
        assert_eq!(
            resolve_startup(&params, Some(&storage)),
            StartupAction::Restore {
                lexicon: Lexicon::Csw21,
                json: "[{\"id\":\"CARE\"}]".into()
            }
        );
    }

    #[test]
    fn url_lexicon_overrides_cache() {
        let mut storage = MemoryStorage::default();
        storage.set_string(CACHE_KEY_LEXICON, "CSW21".into());
        let params = StartupParams {
            lexicon: Some("NWL2018".into()),
            query: None,
        };
        assert_eq!(
            resolve_startup(&params, Some(&storage)),
            StartupAction::Empty {
                lexicon: Lexicon::Nwl20
            }
        );
    }

    #[test]
    fn empty_cache_yields_default_lexicon() {
        let action = resolve_startup(&StartupParams::default(), None);
        assert_eq!(action, StartupAction::Empty { lexicon: Lexicon::Nwl20 });
        assert_eq!(action.lexicon(), Lexicon::Nwl20);
    }
}

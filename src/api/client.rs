// src/api/client.rs
//
// Blocking HTTP client for the /api/v2 surface. Every request carries the
// token header; list endpoints are drained by following `next` links. Errors
// name the endpoint that failed so the caller can report it and keep any
// previously loaded data.

use reqwest::blocking::{Client, Response};
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::types::{Asset, Page, ProjectView};
use crate::config::consts::{API_PREFIX, SURVEY_ASSET_TYPE};
use crate::config::settings::Settings;
use crate::error::Error;
use crate::schema::FormDefinition;

pub struct KoboClient {
    http: Client,
    base: String,
    token: String,
}

impl KoboClient {
    /// Validates the settings and builds the HTTP client with the configured
    /// timeout. Fails before any request leaves the machine.
    pub fn new(settings: &Settings) -> Result<Self, Error> {
        let base = settings.validate()?;
        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| Error::Config(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            base: base.as_str().trim_end_matches('/').to_string(),
            token: settings.token.trim().to_string(),
        })
    }

    /// `next` links arrive absolute; everything else is a server-relative
    /// path.
    fn absolute(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("{}{}", self.base, endpoint)
        }
    }

    fn get(&self, endpoint: &str) -> Result<Response, Error> {
        let url = self.absolute(endpoint);
        log::debug!("GET {url}");
        let resp = self
            .http
            .get(&url)
            .header(AUTHORIZATION, format!("Token {}", self.token))
            .send()
            .map_err(|e| Error::Fetch {
                endpoint: endpoint.to_string(),
                source: e,
            })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Http {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp)
    }

    fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, Error> {
        self.get(endpoint)?.json().map_err(|e| Error::Fetch {
            endpoint: endpoint.to_string(),
            source: e,
        })
    }

    /// Drain a paginated list endpoint.
    fn get_paged<T: DeserializeOwned>(&self, first: String) -> Result<Vec<T>, Error> {
        let mut out = Vec::new();
        let mut next = Some(first);
        while let Some(endpoint) = next {
            let page: Page<T> = self.get_json(&endpoint)?;
            out.extend(page.results);
            next = page.next;
        }
        Ok(out)
    }

    /* ---- endpoints ---- */

    pub fn list_project_views(&self) -> Result<Vec<ProjectView>, Error> {
        self.get_paged(format!("{API_PREFIX}/project-views/?format=json"))
    }

    /// Survey assets reachable through one project view. Other asset types
    /// (blocks, templates, collections) are not projects.
    pub fn list_view_assets(&self, view_uid: &str) -> Result<Vec<Asset>, Error> {
        let all = self.get_paged(format!(
            "{API_PREFIX}/project-views/{view_uid}/assets/?format=json"
        ))?;
        Ok(surveys_only(all))
    }

    /// All survey assets the token can see.
    pub fn list_assets(&self) -> Result<Vec<Asset>, Error> {
        let all = self.get_paged(format!("{API_PREFIX}/assets/?format=json"))?;
        Ok(surveys_only(all))
    }

    pub fn asset_detail(&self, uid: &str) -> Result<Asset, Error> {
        self.get_json(&format!("{API_PREFIX}/assets/{uid}/?format=json"))
    }

    /// Resolve a form definition: the detail endpoint's JSON `content` when
    /// it carries a survey, otherwise the XForm XML rendering. When the XML
    /// is also unavailable the form is reported Missing rather than failing
    /// the batch.
    pub fn fetch_form_definition(&self, uid: &str) -> Result<FormDefinition, Error> {
        let detail = self.asset_detail(uid)?;
        if let Some(content) = detail.content {
            if content.get("survey").map_or(false, Value::is_array) {
                return Ok(FormDefinition::Json(content));
            }
        }
        let endpoint = format!("{API_PREFIX}/assets/{uid}.xml");
        match self.get(&endpoint).and_then(|resp| {
            resp.text().map_err(|e| Error::Fetch {
                endpoint: endpoint.clone(),
                source: e,
            })
        }) {
            Ok(xml) => Ok(FormDefinition::Xml(xml)),
            Err(e) => {
                log::warn!("no XML fallback for {uid}: {e}");
                Ok(FormDefinition::Missing)
            }
        }
    }

    /// XLSForm spreadsheet bytes for one asset.
    pub fn fetch_xlsform(&self, uid: &str) -> Result<Vec<u8>, Error> {
        let endpoint = format!("{API_PREFIX}/assets/{uid}.xls");
        let bytes = self.get(&endpoint)?.bytes().map_err(|e| Error::Fetch {
            endpoint,
            source: e,
        })?;
        Ok(bytes.to_vec())
    }

    /// All submission rows for one asset, across pages.
    pub fn fetch_submissions(&self, uid: &str) -> Result<Vec<Value>, Error> {
        self.get_paged(format!("{API_PREFIX}/assets/{uid}/data/?format=json"))
    }
}

fn surveys_only(assets: Vec<Asset>) -> Vec<Asset> {
    assets
        .into_iter()
        .filter(|a| a.asset_type == SURVEY_ASSET_TYPE)
        .collect()
}

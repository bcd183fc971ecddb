use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{error, info};

use crate::config::load_config;
use crate::error::rws_error;
use crate::odm::extract_form_oids;
use crate::output::{write_csv, write_xml};
use crate::requests::{
    AuditRecordsRequest, ClinicalStudiesRequest, CvMetadataRequest, DatasetFormat, DatasetType,
    FormDataRequest, MetadataStudiesRequest, RwsRequest, StudyDatasetRequest, StudyDraftsRequest,
    StudySubjectsRequest, StudyVersionRequest, StudyVersionsRequest, VersionRequest,
    split_study_oid,
};

const PROTOCOL: &str = "https://";
const MAIN_DOMAIN: &str = ".mdsol.com";

/// Raw-view column suffix requested from the clinical-view metadata endpoint.
const RAWSUFFIX: &str = "RAW";

#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Rave host subdomain (`innovate` for `https://innovate.mdsol.com`), or a
    /// full `http(s)://` base URL for non-mdsol hosts.
    pub subdomain: String,
    /// Rave EDC username.
    pub username: String,
    /// Rave EDC password.
    pub password: String,
    /// Whether to verify TLS certificates.
    pub verify: bool,
}

/// Blocking connection to one Rave Web Services host.
///
/// Every operation is a single authenticated GET against
/// `https://<subdomain>.mdsol.com/RaveWebServices/`; there are no retries and
/// no state besides the lazily built HTTP handle, which is constructed on the
/// first request and reused afterwards.
#[derive(Debug)]
pub struct Connection {
    base_url: String,
    username: String,
    password: String,
    verify: bool,
    timeout: Duration,
    http: OnceLock<HttpClient>,
}

impl Connection {
    /// Creates a connection using environment variables and/or `.rwsapirc`.
    ///
    /// This is equivalent to `Connection::new(None, None, None, None)`.
    pub fn from_env() -> Result<Self> {
        Self::new(None, None, None, None)
    }

    /// Creates a connection using (in order of precedence):
    /// - explicit arguments
    /// - environment variables `RWS_SUBDOMAIN` / `RWS_USERNAME` / `RWS_PASSWORD`
    /// - config file from `RWSAPI_RC` or `.rwsapirc`
    pub fn new(
        subdomain: Option<String>,
        username: Option<String>,
        password: Option<String>,
        verify: Option<bool>,
    ) -> Result<Self> {
        let cfg = load_config(subdomain, username, password, verify)?;
        Ok(Self::from_config(cfg))
    }

    /// Creates a connection from an already assembled configuration.
    pub fn from_config(cfg: ConnectionConfig) -> Self {
        Self {
            base_url: base_url(&cfg.subdomain),
            username: cfg.username,
            password: cfg.password,
            verify: cfg.verify,
            timeout: Duration::from_secs(60),
            http: OnceLock::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base URL requests are issued against, ending in `/RaveWebServices`.
    pub fn url(&self) -> &str {
        &self.base_url
    }

    // The HTTP handle is built on first use and then memoized.
    fn http(&self) -> Result<&HttpClient> {
        if let Some(client) = self.http.get() {
            return Ok(client);
        }

        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("rwsapi-rs/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("rwsapi-rs")),
        );

        let mut builder = HttpClient::builder()
            .default_headers(default_headers)
            .timeout(self.timeout);

        if !self.verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().context("failed to build HTTP client")?;
        Ok(self.http.get_or_init(|| client))
    }

    fn get(&self, request: &impl RwsRequest) -> Result<(String, Response)> {
        let url = format!("{}/{}", self.base_url, request.url_path());
        let resp = self
            .http()?
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .with_context(|| format!("could not connect ({url})"))?;
        Ok((url, resp))
    }

    /// Issues a request and returns the response body.
    ///
    /// A non-success status becomes an error carrying whatever detail the RWS
    /// failure payload provides.
    pub fn send_request(&self, request: &impl RwsRequest) -> Result<String> {
        let (url, resp) = self.get(request)?;
        let status = resp.status();
        let text = resp.text().unwrap_or_default();
        if !status.is_success() {
            return Err(rws_error(status, &url, &text));
        }
        Ok(text)
    }

    /// Issues a version request and returns the HTTP status code, success or
    /// not. Useful as a credentials check.
    pub fn auth_status(&self) -> Result<StatusCode> {
        let (_, resp) = self.get(&VersionRequest)?;
        Ok(resp.status())
    }

    /// RWS build version string.
    pub fn version(&self) -> Result<String> {
        self.send_request(&VersionRequest)
    }

    /// ODM listing of the clinical studies the account is authorized for.
    pub fn clinical_studies(&self) -> Result<String> {
        self.send_request(&ClinicalStudiesRequest)
    }

    /// ODM listing of the studies the account has metadata access to.
    pub fn metadata_studies(&self) -> Result<String> {
        self.send_request(&MetadataStudiesRequest)
    }

    /// Subject list for a study environment, keyed by subject UUID.
    pub fn subjects(&self, study_oid: &str) -> Result<String> {
        let (project, environment) = split_study_oid(study_oid);
        self.send_request(
            &StudySubjectsRequest::new(project, environment).with_subject_key_type("SubjectUUID"),
        )
    }

    /// Ordered list of form OIDs defined in the study's clinical views.
    pub fn forms(&self, study_oid: &str) -> Result<Vec<String>> {
        let (project, environment) = split_study_oid(study_oid);
        let metadata_odm = self
            .send_request(&CvMetadataRequest::new(project, environment).with_rawsuffix(RAWSUFFIX))?;
        extract_form_oids(&metadata_odm)
    }

    /// Full clinical dataset for a study environment, regular views, in ODM.
    pub fn study_dataset(&self, study_oid: &str) -> Result<String> {
        let (project, environment) = split_study_oid(study_oid);
        self.send_request(&StudyDatasetRequest::new(
            project,
            environment,
            DatasetType::Regular,
        ))
    }

    /// Audit trail for a study environment, in ODM.
    pub fn audit_records(&self, study_oid: &str) -> Result<String> {
        let (project, environment) = split_study_oid(study_oid);
        self.send_request(&AuditRecordsRequest::new(project, environment))
    }

    /// CRF drafts defined for the study's project.
    pub fn study_drafts(&self, study_oid: &str) -> Result<String> {
        let (project, _) = split_study_oid(study_oid);
        self.send_request(&StudyDraftsRequest::new(project))
    }

    /// Pushed CRF versions defined for the study's project.
    pub fn study_versions(&self, study_oid: &str) -> Result<String> {
        let (project, _) = split_study_oid(study_oid);
        self.send_request(&StudyVersionsRequest::new(project))
    }

    /// ODM metadata for one pushed CRF version.
    pub fn study_version(&self, study_oid: &str, version_oid: &str) -> Result<String> {
        let (project, _) = split_study_oid(study_oid);
        self.send_request(&StudyVersionRequest::new(project, version_oid))
    }

    /// Clinical-view extract for a single form.
    ///
    /// The gateway terminates some extracts with a literal `EOF` marker; it is
    /// stripped here along with trailing whitespace.
    pub fn form_data(
        &self,
        study_oid: &str,
        dataset_type: DatasetType,
        form_oid: &str,
        dataset_format: DatasetFormat,
    ) -> Result<String> {
        let (project, environment) = split_study_oid(study_oid);
        let data = self.send_request(&FormDataRequest::new(
            project,
            environment,
            dataset_type,
            form_oid,
            dataset_format,
        ))?;
        Ok(strip_eof_marker(&data).to_string())
    }

    /// Fetches one form as CSV and writes it to `<target_dir>/<form_oid>.csv`.
    ///
    /// Any failure (network, auth, disk) is logged and swallowed so that bulk
    /// extraction can continue with the remaining forms; `None` marks the
    /// skipped form.
    pub fn save_form_csv(
        &self,
        study_oid: &str,
        dataset_type: DatasetType,
        form_oid: &str,
        target_dir: &Path,
    ) -> Option<String> {
        info!("reading form [{form_oid}] from study [{study_oid}]");
        match self.fetch_and_write_form(study_oid, dataset_type, form_oid, target_dir) {
            Ok(data) => Some(data),
            Err(err) => {
                error!("failed to read form [{form_oid}] from study [{study_oid}]: {err:#}");
                None
            }
        }
    }

    fn fetch_and_write_form(
        &self,
        study_oid: &str,
        dataset_type: DatasetType,
        form_oid: &str,
        target_dir: &Path,
    ) -> Result<String> {
        let data = self.form_data(study_oid, dataset_type, form_oid, DatasetFormat::Csv)?;
        write_csv(&data, &target_dir.join(format!("{form_oid}.csv")))?;
        Ok(data)
    }

    /// Fetches the study's form list and writes every form's regular-view CSV
    /// into `target_dir`. Forms that fail are logged and skipped; the OIDs
    /// actually written are returned.
    pub fn save_all_forms(&self, study_oid: &str, target_dir: &Path) -> Result<Vec<String>> {
        fs::create_dir_all(target_dir)
            .with_context(|| format!("failed to create directory {}", target_dir.display()))?;

        let forms = self.forms(study_oid)?;
        let mut saved = Vec::with_capacity(forms.len());
        for form_oid in forms {
            if self
                .save_form_csv(study_oid, DatasetType::Regular, &form_oid, target_dir)
                .is_some()
            {
                saved.push(form_oid);
            }
        }
        Ok(saved)
    }

    /// Fetches the study's clinical dataset and writes it as a BOM-prefixed
    /// UTF-8 XML file. Returns the written document, or an empty string when
    /// the payload held no XML (in which case no file is produced).
    pub fn save_odm_xml(&self, study_oid: &str, target: &Path) -> Result<String> {
        let data = self.study_dataset(study_oid)?;
        write_xml(&data, target)
    }

    /// Fetches the study's audit trail and writes it as an XML file.
    pub fn save_audit_xml(&self, study_oid: &str, target: &Path) -> Result<String> {
        let data = self.audit_records(study_oid)?;
        write_xml(&data, target)
    }

    /// Fetches the project's CRF drafts and writes them as an XML file.
    pub fn save_study_drafts_xml(&self, study_oid: &str, target: &Path) -> Result<String> {
        let data = self.study_drafts(study_oid)?;
        write_xml(&data, target)
    }

    /// Fetches one pushed CRF version and writes it as an XML file.
    pub fn save_study_version_xml(
        &self,
        study_oid: &str,
        version_oid: &str,
        target: &Path,
    ) -> Result<String> {
        let data = self.study_version(study_oid, version_oid)?;
        write_xml(&data, target)
    }
}

fn base_url(subdomain: &str) -> String {
    // Accept either a bare subdomain or a full base URL, the latter mainly
    // for hosts outside *.mdsol.com.
    let host = if subdomain.contains("://") {
        subdomain.trim_end_matches('/').to_string()
    } else {
        format!("{PROTOCOL}{subdomain}{MAIN_DOMAIN}")
    };
    format!("{host}/RaveWebServices")
}

/// Drops the Biostat Gateway's literal `EOF` terminator plus surrounding
/// trailing whitespace, when present.
fn strip_eof_marker(data: &str) -> &str {
    let trimmed = data.trim_end();
    trimmed
        .strip_suffix("EOF")
        .map(str::trim_end)
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_from_subdomain() {
        assert_eq!(
            base_url("innovate"),
            "https://innovate.mdsol.com/RaveWebServices"
        );
    }

    #[test]
    fn base_url_from_full_url() {
        assert_eq!(
            base_url("http://127.0.0.1:8080/"),
            "http://127.0.0.1:8080/RaveWebServices"
        );
    }

    #[test]
    fn strips_eof_marker_and_trailing_whitespace() {
        assert_eq!(
            strip_eof_marker("SUBJECT,AETERM\n001,Headache\nEOF \n"),
            "SUBJECT,AETERM\n001,Headache"
        );
    }

    #[test]
    fn leaves_data_without_marker_untouched() {
        assert_eq!(strip_eof_marker("a,b\n1,2"), "a,b\n1,2");
    }

    #[test]
    fn eof_inside_data_is_kept() {
        assert_eq!(strip_eof_marker("a\nEOF\nb\n"), "a\nEOF\nb");
    }
}

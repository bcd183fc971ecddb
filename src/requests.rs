//! Pre-built request objects for the RWS endpoints this crate speaks to.
//!
//! Each struct knows its URL path relative to the `RaveWebServices/` base;
//! [`crate::Connection::send_request`] supplies transport and authentication.

/// A single RWS operation, reduced to the URL path it is served from.
///
/// All RWS endpoints used here are plain authenticated GETs, so the path is
/// the only thing a request needs to carry.
pub trait RwsRequest {
    /// URL path relative to `https://<host>/RaveWebServices/`.
    fn url_path(&self) -> String;
}

/// Dataset view to extract from: production ("regular") or raw entry data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetType {
    Regular,
    Raw,
}

impl DatasetType {
    pub fn as_str(self) -> &'static str {
        match self {
            DatasetType::Regular => "regular",
            DatasetType::Raw => "raw",
        }
    }
}

/// Output format for clinical-view extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Csv,
    Xml,
}

/// Splits a composite study identifier `"PROJECT(ENV)"` into project and
/// environment. No validation: a string without parentheses comes back as
/// the whole project with an empty environment.
pub(crate) fn split_study_oid(study_oid: &str) -> (&str, &str) {
    match study_oid.split_once('(') {
        Some((project, rest)) => (project, rest.trim_end_matches(')')),
        None => (study_oid, ""),
    }
}

/// `"Project(Env)"`, or just `"Project"` when the environment is empty.
fn studyname_environment(project_name: &str, environment_name: &str) -> String {
    if environment_name.is_empty() {
        project_name.to_string()
    } else {
        format!("{project_name}({environment_name})")
    }
}

fn make_url(segments: &[&str], params: &[(&str, &str)]) -> String {
    let mut url = segments.join("/");
    let mut sep = '?';
    for (k, v) in params {
        url.push(sep);
        url.push_str(k);
        url.push('=');
        url.push_str(v);
        sep = '&';
    }
    url
}

/// Fetches the RWS build version string from `version`.
#[derive(Debug, Clone, Copy)]
pub struct VersionRequest;

impl RwsRequest for VersionRequest {
    fn url_path(&self) -> String {
        "version".to_string()
    }
}

/// Fetches the ODM listing of the studies the account is authorized for.
#[derive(Debug, Clone, Copy)]
pub struct ClinicalStudiesRequest;

impl RwsRequest for ClinicalStudiesRequest {
    fn url_path(&self) -> String {
        "studies".to_string()
    }
}

/// Fetches the ODM listing of studies the account has metadata access to.
#[derive(Debug, Clone, Copy)]
pub struct MetadataStudiesRequest;

impl RwsRequest for MetadataStudiesRequest {
    fn url_path(&self) -> String {
        "metadata/studies".to_string()
    }
}

/// Subject list for one study environment.
#[derive(Debug, Clone)]
pub struct StudySubjectsRequest {
    project_name: String,
    environment_name: String,
    subject_key_type: String,
}

impl StudySubjectsRequest {
    pub fn new(project_name: &str, environment_name: &str) -> Self {
        Self {
            project_name: project_name.to_string(),
            environment_name: environment_name.to_string(),
            subject_key_type: "SubjectName".to_string(),
        }
    }

    /// Key subjects by something other than the default `SubjectName`,
    /// e.g. `SubjectUUID`.
    pub fn with_subject_key_type(mut self, subject_key_type: &str) -> Self {
        self.subject_key_type = subject_key_type.to_string();
        self
    }
}

impl RwsRequest for StudySubjectsRequest {
    fn url_path(&self) -> String {
        let sne = studyname_environment(&self.project_name, &self.environment_name);
        let mut params: Vec<(&str, &str)> = Vec::new();
        // RWS treats SubjectName as the implicit default.
        if self.subject_key_type != "SubjectName" {
            params.push(("subjectKeyType", &self.subject_key_type));
        }
        make_url(&["studies", &sne, "subjects"], &params)
    }
}

/// Full clinical dataset for one study environment, in ODM.
#[derive(Debug, Clone)]
pub struct StudyDatasetRequest {
    project_name: String,
    environment_name: String,
    dataset_type: DatasetType,
}

impl StudyDatasetRequest {
    pub fn new(project_name: &str, environment_name: &str, dataset_type: DatasetType) -> Self {
        Self {
            project_name: project_name.to_string(),
            environment_name: environment_name.to_string(),
            dataset_type,
        }
    }
}

impl RwsRequest for StudyDatasetRequest {
    fn url_path(&self) -> String {
        let sne = studyname_environment(&self.project_name, &self.environment_name);
        make_url(&["studies", &sne, "datasets", self.dataset_type.as_str()], &[])
    }
}

/// CRF drafts defined for a project.
#[derive(Debug, Clone)]
pub struct StudyDraftsRequest {
    project_name: String,
}

impl StudyDraftsRequest {
    pub fn new(project_name: &str) -> Self {
        Self {
            project_name: project_name.to_string(),
        }
    }
}

impl RwsRequest for StudyDraftsRequest {
    fn url_path(&self) -> String {
        make_url(&["metadata", "studies", &self.project_name, "drafts"], &[])
    }
}

/// Pushed CRF versions defined for a project.
#[derive(Debug, Clone)]
pub struct StudyVersionsRequest {
    project_name: String,
}

impl StudyVersionsRequest {
    pub fn new(project_name: &str) -> Self {
        Self {
            project_name: project_name.to_string(),
        }
    }
}

impl RwsRequest for StudyVersionsRequest {
    fn url_path(&self) -> String {
        make_url(&["metadata", "studies", &self.project_name, "versions"], &[])
    }
}

/// ODM metadata for one pushed CRF version.
#[derive(Debug, Clone)]
pub struct StudyVersionRequest {
    project_name: String,
    oid: String,
}

impl StudyVersionRequest {
    pub fn new(project_name: &str, oid: &str) -> Self {
        Self {
            project_name: project_name.to_string(),
            oid: oid.to_string(),
        }
    }
}

impl RwsRequest for StudyVersionRequest {
    fn url_path(&self) -> String {
        make_url(
            &["metadata", "studies", &self.project_name, "versions", &self.oid],
            &[],
        )
    }
}

/// Clinical-view column metadata (Biostat Gateway), in ODM.
#[derive(Debug, Clone)]
pub struct CvMetadataRequest {
    project_name: String,
    environment_name: String,
    rawsuffix: Option<String>,
}

impl CvMetadataRequest {
    pub fn new(project_name: &str, environment_name: &str) -> Self {
        Self {
            project_name: project_name.to_string(),
            environment_name: environment_name.to_string(),
            rawsuffix: None,
        }
    }

    /// Suffix appended to raw-view column names in the returned metadata.
    pub fn with_rawsuffix(mut self, rawsuffix: &str) -> Self {
        self.rawsuffix = Some(rawsuffix.to_string());
        self
    }
}

impl RwsRequest for CvMetadataRequest {
    fn url_path(&self) -> String {
        let sne = studyname_environment(&self.project_name, &self.environment_name);
        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(rawsuffix) = &self.rawsuffix {
            params.push(("rawsuffix", rawsuffix));
        }
        make_url(&["studies", &sne, "datasets", "metadata", "regular"], &params)
    }
}

/// Clinical-view extract for a single form (Biostat Gateway).
#[derive(Debug, Clone)]
pub struct FormDataRequest {
    project_name: String,
    environment_name: String,
    dataset_type: DatasetType,
    form_oid: String,
    dataset_format: DatasetFormat,
}

impl FormDataRequest {
    pub fn new(
        project_name: &str,
        environment_name: &str,
        dataset_type: DatasetType,
        form_oid: &str,
        dataset_format: DatasetFormat,
    ) -> Self {
        Self {
            project_name: project_name.to_string(),
            environment_name: environment_name.to_string(),
            dataset_type,
            form_oid: form_oid.to_string(),
            dataset_format,
        }
    }
}

impl RwsRequest for FormDataRequest {
    fn url_path(&self) -> String {
        let sne = studyname_environment(&self.project_name, &self.environment_name);
        // XML is the endpoint default; CSV is selected via the extension.
        let dataset_name = match self.dataset_format {
            DatasetFormat::Csv => format!("{}.csv", self.form_oid),
            DatasetFormat::Xml => self.form_oid.clone(),
        };
        make_url(
            &[
                "studies",
                &sne,
                "datasets",
                self.dataset_type.as_str(),
                &dataset_name,
            ],
            &[],
        )
    }
}

/// Audit trail for one study environment (ODM Adapter).
#[derive(Debug, Clone)]
pub struct AuditRecordsRequest {
    project_name: String,
    environment_name: String,
    startid: Option<u64>,
    per_page: Option<u32>,
}

impl AuditRecordsRequest {
    pub fn new(project_name: &str, environment_name: &str) -> Self {
        Self {
            project_name: project_name.to_string(),
            environment_name: environment_name.to_string(),
            startid: None,
            per_page: None,
        }
    }

    /// First audit-record id of the page to fetch.
    pub fn with_startid(mut self, startid: u64) -> Self {
        self.startid = Some(startid);
        self
    }

    /// Page size requested from the adapter.
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }
}

impl RwsRequest for AuditRecordsRequest {
    fn url_path(&self) -> String {
        let studyoid = studyname_environment(&self.project_name, &self.environment_name);
        let startid = self.startid.map(|v| v.to_string());
        let per_page = self.per_page.map(|v| v.to_string());

        let mut params: Vec<(&str, &str)> = vec![("studyoid", &studyoid)];
        if let Some(startid) = &startid {
            params.push(("startid", startid));
        }
        if let Some(per_page) = &per_page {
            params.push(("per_page", per_page));
        }
        make_url(&["datasets", "ClinicalAuditRecords.odm"], &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_project_and_environment() {
        assert_eq!(split_study_oid("Mediflex(Dev)"), ("Mediflex", "Dev"));
        assert_eq!(split_study_oid("A(B)"), ("A", "B"));
    }

    #[test]
    fn split_without_parentheses_keeps_whole_project() {
        assert_eq!(split_study_oid("Mediflex"), ("Mediflex", ""));
    }

    #[test]
    fn split_with_empty_environment() {
        assert_eq!(split_study_oid("Mediflex()"), ("Mediflex", ""));
    }

    #[test]
    fn subjects_url_carries_key_type() {
        let req = StudySubjectsRequest::new("Mediflex", "Dev")
            .with_subject_key_type("SubjectUUID");
        assert_eq!(
            req.url_path(),
            "studies/Mediflex(Dev)/subjects?subjectKeyType=SubjectUUID"
        );
    }

    #[test]
    fn subjects_url_omits_default_key_type() {
        let req = StudySubjectsRequest::new("Mediflex", "Dev");
        assert_eq!(req.url_path(), "studies/Mediflex(Dev)/subjects");
    }

    #[test]
    fn study_dataset_url() {
        let req = StudyDatasetRequest::new("Mediflex", "Prod", DatasetType::Regular);
        assert_eq!(req.url_path(), "studies/Mediflex(Prod)/datasets/regular");
    }

    #[test]
    fn cv_metadata_url_with_rawsuffix() {
        let req = CvMetadataRequest::new("Mediflex", "Dev").with_rawsuffix("RAW");
        assert_eq!(
            req.url_path(),
            "studies/Mediflex(Dev)/datasets/metadata/regular?rawsuffix=RAW"
        );
    }

    #[test]
    fn form_data_url_appends_csv_extension() {
        let req = FormDataRequest::new("Mediflex", "Dev", DatasetType::Raw, "AE", DatasetFormat::Csv);
        assert_eq!(req.url_path(), "studies/Mediflex(Dev)/datasets/raw/AE.csv");
    }

    #[test]
    fn form_data_url_xml_has_no_extension() {
        let req =
            FormDataRequest::new("Mediflex", "Dev", DatasetType::Regular, "DM", DatasetFormat::Xml);
        assert_eq!(req.url_path(), "studies/Mediflex(Dev)/datasets/regular/DM");
    }

    #[test]
    fn audit_records_url() {
        let req = AuditRecordsRequest::new("Mediflex", "Dev")
            .with_startid(1)
            .with_per_page(100);
        assert_eq!(
            req.url_path(),
            "datasets/ClinicalAuditRecords.odm?studyoid=Mediflex(Dev)&startid=1&per_page=100"
        );
    }

    #[test]
    fn metadata_urls() {
        assert_eq!(
            StudyDraftsRequest::new("Mediflex").url_path(),
            "metadata/studies/Mediflex/drafts"
        );
        assert_eq!(
            StudyVersionsRequest::new("Mediflex").url_path(),
            "metadata/studies/Mediflex/versions"
        );
        assert_eq!(
            StudyVersionRequest::new("Mediflex", "1234").url_path(),
            "metadata/studies/Mediflex/versions/1234"
        );
    }

    #[test]
    fn project_only_study_environment() {
        let req = StudyDatasetRequest::new("Mediflex", "", DatasetType::Regular);
        assert_eq!(req.url_path(), "studies/Mediflex/datasets/regular");
    }
}

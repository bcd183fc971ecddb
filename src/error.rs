use anyhow::anyhow;
use reqwest::StatusCode;

/// RWS failure body, e.g.
/// `<Response ReferenceNumber="..." IsTransactionSuccessful="0"
///  ReasonCode="RWS00092" ErrorClientResponseMessage="..."/>`.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct RwsErrorResponse {
    #[serde(default, rename = "@ReferenceNumber")]
    pub(crate) reference_number: Option<String>,
    #[serde(default, rename = "@InboundODMFileOID")]
    pub(crate) inbound_odm_file_oid: Option<String>,
    #[serde(default, rename = "@ReasonCode")]
    pub(crate) reason_code: Option<String>,
    #[serde(default, rename = "@ErrorClientResponseMessage")]
    pub(crate) error_message: Option<String>,
}

// Some endpoints report failure as an ODM file instead of a Response element.
#[derive(Debug, serde::Deserialize)]
struct OdmErrorResponse {
    #[serde(default, rename = "@ErrorDescription")]
    error_description: Option<String>,
}

/// Turns a non-success RWS response into an error with whatever detail the
/// body carries.
pub(crate) fn rws_error(status: StatusCode, url: &str, body: &str) -> anyhow::Error {
    if let Ok(resp) = quick_xml::de::from_str::<RwsErrorResponse>(body) {
        if resp.reason_code.is_some() || resp.error_message.is_some() {
            return format_rws_error(status, url, &resp);
        }
    }

    if let Ok(odm) = quick_xml::de::from_str::<OdmErrorResponse>(body) {
        if let Some(description) = odm.error_description {
            return anyhow!(
                "RWS request failed: HTTP {} for url ({})\n{}",
                status,
                url,
                description
            );
        }
    }

    anyhow!(
        "RWS request failed: HTTP {} for url ({})\n{}",
        status,
        url,
        body
    )
}

fn format_rws_error(status: StatusCode, url: &str, e: &RwsErrorResponse) -> anyhow::Error {
    let message = e.error_message.as_deref().unwrap_or("");
    let reason = e.reason_code.as_deref().unwrap_or("");
    let reference = e.reference_number.as_deref().unwrap_or("(none)");
    let file_oid = e.inbound_odm_file_oid.as_deref().unwrap_or("");

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return anyhow!(
            "RWS authentication/authorization failed (HTTP {}).\n- Check the Rave username and password\n- Ensure the account is active and not locked out in Rave EDC\n- Ensure the account is authorized for the module you are calling\n\nServer message: {}\nreason: {}\nreference: {}\nrequest: {}",
            status.as_u16(),
            message,
            reason,
            reference,
            url
        );
    }

    if status == StatusCode::NOT_FOUND {
        return anyhow!(
            "RWS endpoint not found (HTTP 404).\n- Check the host subdomain\n- Check that the study, environment, or form OID exists and is spelled exactly as in Rave\n\nServer message: {}\nreason: {}\nrequest: {}",
            message,
            reason,
            url
        );
    }

    anyhow!(
        "RWS request failed: HTTP {} for url ({})\nreason: {}\n{}{}",
        status.as_u16(),
        url,
        reason,
        message,
        if file_oid.is_empty() {
            String::new()
        } else {
            format!("\nfile oid: {file_oid}")
        }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE_BODY: &str = r#"<Response ReferenceNumber="82e942b0-48e8-4cf4-b299-51e2b6a89a1b"
        InboundODMFileOID=""
        IsTransactionSuccessful="0"
        ReasonCode="RWS00092"
        ErrorClientResponseMessage="CRF version not found"/>"#;

    #[test]
    fn parses_response_error_attributes() {
        let resp: RwsErrorResponse = quick_xml::de::from_str(RESPONSE_BODY).unwrap();
        assert_eq!(resp.reason_code.as_deref(), Some("RWS00092"));
        assert_eq!(resp.error_message.as_deref(), Some("CRF version not found"));
        assert_eq!(
            resp.reference_number.as_deref(),
            Some("82e942b0-48e8-4cf4-b299-51e2b6a89a1b")
        );
    }

    #[test]
    fn formats_reason_code_into_error() {
        let err = rws_error(
            StatusCode::BAD_REQUEST,
            "https://innovate.mdsol.com/RaveWebServices/studies",
            RESPONSE_BODY,
        );
        let text = err.to_string();
        assert!(text.contains("RWS00092"));
        assert!(text.contains("CRF version not found"));
    }

    #[test]
    fn unauthorized_mentions_credentials() {
        let err = rws_error(
            StatusCode::UNAUTHORIZED,
            "https://innovate.mdsol.com/RaveWebServices/version",
            r#"<Response IsTransactionSuccessful="0" ReasonCode="RWS00008" ErrorClientResponseMessage="Authorization Header not accepted"/>"#,
        );
        assert!(err.to_string().contains("username and password"));
    }

    #[test]
    fn odm_error_description_is_surfaced() {
        let body = r#"<ODM xmlns="http://www.cdisc.org/ns/odm/v1.3" ErrorDescription="Subject not found"/>"#;
        let err = rws_error(StatusCode::NOT_FOUND, "url", body);
        assert!(err.to_string().contains("Subject not found"));
    }

    #[test]
    fn unparseable_body_falls_back_to_raw_text() {
        let err = rws_error(StatusCode::INTERNAL_SERVER_ERROR, "url", "oops");
        assert!(err.to_string().contains("oops"));
        assert!(err.to_string().contains("HTTP 500"));
    }
}

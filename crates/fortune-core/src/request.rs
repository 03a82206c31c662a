use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("birthDate is required")]
    MissingBirthDate,
    #[error("request body must be a JSON object")]
    NotAnObject,
}

/// Canonical form of the inbound reading request. Strings are trimmed and
/// blank fields become `None`; nothing downstream re-checks presence.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FortuneRequest {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub birth_date: String,
    pub birth_time: Option<String>,
    pub birth_city: Option<String>,
    #[serde(skip)]
    pub unlock_code: Option<String>,
}

impl FortuneRequest {
    pub fn new(birth_date: impl Into<String>) -> Self {
        Self {
            name: None,
            gender: None,
            birth_date: birth_date.into(),
            birth_time: None,
            birth_city: None,
            unlock_code: None,
        }
    }

    pub fn from_body(body: &Value) -> Result<Self, ValidationError> {
        let obj = match body {
            Value::Object(obj) => obj,
            Value::Null => return Err(ValidationError::MissingBirthDate),
            _ => return Err(ValidationError::NotAnObject),
        };
        let field = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let birth_date = field("birthDate").ok_or(ValidationError::MissingBirthDate)?;
        Ok(Self {
            name: field("name"),
            gender: field("gender"),
            birth_date,
            birth_time: field("birthTime"),
            birth_city: field("birthCity"),
            unlock_code: field("unlock_code"),
        })
    }

    pub fn birth_time_or_empty(&self) -> &str {
        self.birth_time.as_deref().unwrap_or("")
    }

    pub fn birth_city_or_empty(&self) -> &str {
        self.birth_city.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_blank_fields() {
        let req = FortuneRequest::from_body(&json!({
            "name": "  ",
            "birthDate": " 1990-01-01 ",
            "birthTime": "08:30",
            "birthCity": "",
            "unlock_code": "VIP-1"
        }))
        .unwrap();
        assert_eq!(req.birth_date, "1990-01-01");
        assert_eq!(req.name, None);
        assert_eq!(req.birth_time.as_deref(), Some("08:30"));
        assert_eq!(req.birth_city, None);
        assert_eq!(req.unlock_code.as_deref(), Some("VIP-1"));
    }

    #[test]
    fn birth_date_is_required() {
        assert_eq!(
            FortuneRequest::from_body(&json!({"name": "Mei"})),
            Err(ValidationError::MissingBirthDate)
        );
        assert_eq!(
            FortuneRequest::from_body(&json!({"birthDate": 19900101})),
            Err(ValidationError::MissingBirthDate)
        );
        assert_eq!(
            FortuneRequest::from_body(&Value::Null),
            Err(ValidationError::MissingBirthDate)
        );
        assert_eq!(
            FortuneRequest::from_body(&json!(["1990-01-01"])),
            Err(ValidationError::NotAnObject)
        );
    }

    #[test]
    fn unlock_code_is_not_echoed() {
        let mut req = FortuneRequest::new("1990-01-01");
        req.unlock_code = Some("secret".to_string());
        let out = serde_json::to_value(&req).unwrap();
        assert!(out.get("unlock_code").is_none());
        assert!(out.get("unlockCode").is_none());
        assert_eq!(out["birthDate"], "1990-01-01");
    }
}

//! Request-side parsing: strict JSON/query extractors that reject with the
//! standard error envelope, and small helpers shared by the handlers.

use std::fmt;

use axum::extract::{FromRequest, FromRequestParts, OptionalFromRequest, Query, Request};
use axum::http::header;
use axum::http::request::Parts;
use axum::Json;
use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use companion_core::calendar;
use serde::de::{self, DeserializeOwned, Unexpected, Visitor};
use serde::{Deserialize, Deserializer};

use crate::error::ApiError;

/// A boolean flag that also accepts the numbers 0 and 1, the way the
/// stored columns spell booleans. Anything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flag(pub bool);

impl From<Flag> for bool {
    fn from(flag: Flag) -> bool {
        flag.0
    }
}

impl<'de> Deserialize<'de> for Flag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FlagVisitor;

        impl<'de> Visitor<'de> for FlagVisitor {
            type Value = Flag;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a boolean or the number 0 or 1")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Flag, E> {
                Ok(Flag(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Flag, E>
            where
                E: de::Error,
            {
                match value {
                    0 => Ok(Flag(false)),
                    1 => Ok(Flag(true)),
                    _ => Err(E::invalid_value(Unexpected::Unsigned(value), &self)),
                }
            }

            fn visit_i64<E>(self, value: i64) -> Result<Flag, E>
            where
                E: de::Error,
            {
                match value {
                    0 => Ok(Flag(false)),
                    1 => Ok(Flag(true)),
                    _ => Err(E::invalid_value(Unexpected::Signed(value), &self)),
                }
            }
        }

        deserializer.deserialize_any(FlagVisitor)
    }
}

/// JSON body extractor whose rejection is the standard 400 envelope
/// instead of axum's plain-text default.
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match <Json<T> as FromRequest<S>>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidJson(value)),
            Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
        }
    }
}

/// `Option<ValidJson<T>>` treats a bodyless request as `None`; once a
/// content type is present the body must parse like any other.
impl<T, S> OptionalFromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        if req.headers().get(header::CONTENT_TYPE).is_none() {
            return Ok(None);
        }
        <ValidJson<T> as FromRequest<S>>::from_request(req, state)
            .await
            .map(Some)
    }
}

/// Query-string extractor with the same enveloped rejection.
pub struct ValidQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ValidQuery(value)),
            Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
        }
    }
}

/// Decode a tri-state date field from a PATCH body: absent, explicit
/// null (clear), or a value that must parse.
pub fn parse_date_patch(
    field: &Option<Option<String>>,
) -> Result<Option<Option<NaiveDate>>, ApiError> {
    match field {
        None => Ok(None),
        Some(None) => Ok(Some(None)),
        Some(Some(raw)) => Ok(Some(Some(calendar::parse_date(raw)?))),
    }
}

/// Tri-state clock-time counterpart of [`parse_date_patch`].
pub fn parse_time_patch(
    field: &Option<Option<String>>,
) -> Result<Option<Option<NaiveTime>>, ApiError> {
    match field {
        None => Ok(None),
        Some(None) => Ok(Some(None)),
        Some(Some(raw)) => Ok(Some(Some(calendar::parse_time(raw)?))),
    }
}

/// The calendar day a request is about: an explicit `?date=` wins,
/// otherwise today in the configured timezone.
pub fn resolve_date(param: Option<&str>, timezone: Tz) -> Result<NaiveDate, ApiError> {
    match param {
        Some(raw) => Ok(calendar::parse_date(raw)?),
        None => Ok(calendar::today_in(timezone)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct FlagProbe {
        #[serde(default)]
        value: Option<Flag>,
    }

    #[test]
    fn flag_accepts_bools_and_binary_digits() {
        let probe: FlagProbe = serde_json::from_str(r#"{"value": true}"#).expect("bool");
        assert_eq!(probe.value, Some(Flag(true)));

        let probe: FlagProbe = serde_json::from_str(r#"{"value": 1}"#).expect("one");
        assert_eq!(probe.value, Some(Flag(true)));

        let probe: FlagProbe = serde_json::from_str(r#"{"value": 0}"#).expect("zero");
        assert_eq!(probe.value, Some(Flag(false)));

        let probe: FlagProbe = serde_json::from_str(r#"{}"#).expect("absent");
        assert_eq!(probe.value, None);
    }

    #[test]
    fn flag_rejects_everything_else() {
        assert!(serde_json::from_str::<FlagProbe>(r#"{"value": 2}"#).is_err());
        assert!(serde_json::from_str::<FlagProbe>(r#"{"value": -1}"#).is_err());
        assert!(serde_json::from_str::<FlagProbe>(r#"{"value": "yes"}"#).is_err());
        assert!(serde_json::from_str::<FlagProbe>(r#"{"value": 1.0}"#).is_err());
    }

    #[derive(Deserialize)]
    struct PatchProbe {
        #[serde(default, with = "serde_with::rust::double_option")]
        date: Option<Option<String>>,
    }

    #[test]
    fn double_option_distinguishes_absent_null_and_value() {
        let probe: PatchProbe = serde_json::from_str(r#"{}"#).expect("absent");
        assert_eq!(probe.date, None);

        let probe: PatchProbe = serde_json::from_str(r#"{"date": null}"#).expect("null");
        assert_eq!(probe.date, Some(None));

        let probe: PatchProbe = serde_json::from_str(r#"{"date": "2024-10-03"}"#).expect("value");
        assert_eq!(probe.date, Some(Some("2024-10-03".to_string())));
    }

    #[test]
    fn date_patch_parsing() {
        assert!(matches!(parse_date_patch(&None), Ok(None)));
        assert!(matches!(parse_date_patch(&Some(None)), Ok(Some(None))));

        let parsed = parse_date_patch(&Some(Some("2024-10-03".to_string()))).expect("parse");
        assert_eq!(
            parsed,
            Some(Some(NaiveDate::from_ymd_opt(2024, 10, 3).unwrap()))
        );

        assert!(parse_date_patch(&Some(Some("03/10/2024".to_string()))).is_err());
    }

    #[test]
    fn time_patch_parsing() {
        let parsed = parse_time_patch(&Some(Some("08:30".to_string()))).expect("short form");
        assert_eq!(
            parsed,
            Some(Some(NaiveTime::from_hms_opt(8, 30, 0).unwrap()))
        );
        assert!(parse_time_patch(&Some(Some("8.30am".to_string()))).is_err());
    }

    #[test]
    fn explicit_date_param_wins() {
        let tz = chrono_tz::Asia::Singapore;
        let picked = resolve_date(Some("2024-10-03"), tz).expect("parse");
        assert_eq!(picked, NaiveDate::from_ymd_opt(2024, 10, 3).unwrap());

        assert!(resolve_date(Some("not-a-date"), tz).is_err());
        assert!(resolve_date(None, tz).is_ok());
    }
}

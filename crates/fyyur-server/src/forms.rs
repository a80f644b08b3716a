//! Decoding and validation of HTML form submissions.
//!
//! Bodies arrive as `application/x-www-form-urlencoded`; [`FormData`] keeps
//! every key/value pair so repeated keys (the `genres` checkboxes) survive
//! decoding. Validation collects per-field errors instead of failing on the
//! first problem, so a rejected form can be re-rendered with all of them.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use url::Url;

use fyyur_db::entities::{artist, venue};
use fyyur_db::genres;

/// State codes offered by the form, in form order.
pub const STATE_CODES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL", "IN",
    "IA", "KS", "KY", "LA", "ME", "MT", "NE", "NV", "NH", "NJ", "NM", "NY", "NC", "ND", "OH",
    "OK", "OR", "MD", "MA", "MI", "MN", "MS", "MO", "PA", "RI", "SC", "SD", "TN", "TX", "UT",
    "VT", "VA", "WA", "WV", "WI", "WY",
];

/// Genre choices offered by the form. Tags are stored as free text, so these
/// are suggestions, not an enum.
pub const GENRE_CHOICES: &[&str] = &[
    "Alternative",
    "Blues",
    "Classical",
    "Country",
    "Electronic",
    "Folk",
    "Funk",
    "Hip-Hop",
    "Heavy Metal",
    "Instrumental",
    "Jazz",
    "Musical Theatre",
    "Pop",
    "Punk",
    "R&B",
    "Reggae",
    "Rock n Roll",
    "Soul",
    "Other",
];

/// Timestamp formats accepted for a show's start time. Covers the classic
/// `YYYY-MM-DD HH:MM:SS` form and HTML `datetime-local` inputs.
const START_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

pub fn parse_start_time(value: &str) -> Option<NaiveDateTime> {
    START_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// A decoded urlencoded body, preserving repeated keys.
#[derive(Debug, Default)]
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl FormData {
    pub fn parse(body: &[u8]) -> Self {
        Self {
            pairs: url::form_urlencoded::parse(body)
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All values submitted under one key, in submission order.
    pub fn get_all(&self, key: &str) -> Vec<String> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// Checkbox semantics: present means checked, whatever the value.
    pub fn has(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }
}

/// Per-field validation errors, serialized as `{field: [messages]}`.
#[derive(Debug, Default, Serialize)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// One-line summary suitable for a flash message or a log line.
    pub fn summary(&self) -> String {
        self.0
            .iter()
            .map(|(field, msgs)| format!("{field}: {}", msgs.join(", ")))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

fn required(data: &FormData, field: &str, errors: &mut FormErrors) -> String {
    match data.get(field).map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => {
            errors.add(field, "this field is required");
            String::new()
        }
    }
}

fn optional(data: &FormData, field: &str) -> Option<String> {
    data.get(field)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn check_state(value: &str, errors: &mut FormErrors) {
    if !value.is_empty() && !STATE_CODES.contains(&value) {
        errors.add("state", "not a valid state code");
    }
}

fn check_link(field: &str, value: &Option<String>, errors: &mut FormErrors) {
    if let Some(link) = value {
        match Url::parse(link) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => errors.add(field, "must be a valid http(s) URL"),
        }
    }
}

fn check_phone(value: &Option<String>, errors: &mut FormErrors) {
    if let Some(phone) = value {
        let ok = phone
            .chars()
            .all(|c| c.is_ascii_digit() || "+-() .".contains(c));
        if !ok {
            errors.add("phone", "may only contain digits, spaces and + - ( ) .");
        }
    }
}

fn submitted_genres(data: &FormData) -> Vec<String> {
    data.get_all("genres")
        .into_iter()
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .collect()
}

/// A venue create/edit submission: the decoded values, whether valid or not,
/// so a rejected form can be re-rendered with what the user typed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VenueForm {
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: Option<String>,
    pub genres: Vec<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website_link: Option<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
}

impl VenueForm {
    pub fn from_form(data: &FormData) -> (Self, FormErrors) {
        let mut errors = FormErrors::default();

        let form = Self {
            name: required(data, "name", &mut errors),
            city: required(data, "city", &mut errors),
            state: required(data, "state", &mut errors),
            address: required(data, "address", &mut errors),
            phone: optional(data, "phone"),
            genres: submitted_genres(data),
            image_link: optional(data, "image_link"),
            facebook_link: optional(data, "facebook_link"),
            website_link: optional(data, "website_link"),
            seeking_talent: data.has("seeking_talent"),
            seeking_description: optional(data, "seeking_description"),
        };

        check_state(&form.state, &mut errors);
        check_phone(&form.phone, &mut errors);
        check_link("image_link", &form.image_link, &mut errors);
        check_link("facebook_link", &form.facebook_link, &mut errors);
        check_link("website_link", &form.website_link, &mut errors);

        (form, errors)
    }

    /// Pre-populate the edit form from a stored row.
    pub fn from_model(model: venue::Model) -> Self {
        Self {
            name: model.name,
            city: model.city,
            state: model.state,
            address: model.address,
            phone: model.phone,
            genres: genres::split(&model.genres),
            image_link: model.image_link,
            facebook_link: model.facebook_link,
            website_link: model.website_link,
            seeking_talent: model.seeking_talent,
            seeking_description: model.seeking_description,
        }
    }
}

/// An artist create/edit submission; same shape as [`VenueForm`] minus the
/// street address, with the seeking flag inverted in meaning.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArtistForm {
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub genres: Vec<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website_link: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
}

impl ArtistForm {
    pub fn from_form(data: &FormData) -> (Self, FormErrors) {
        let mut errors = FormErrors::default();

        let form = Self {
            name: required(data, "name", &mut errors),
            city: required(data, "city", &mut errors),
            state: required(data, "state", &mut errors),
            phone: optional(data, "phone"),
            genres: submitted_genres(data),
            image_link: optional(data, "image_link"),
            facebook_link: optional(data, "facebook_link"),
            website_link: optional(data, "website_link"),
            seeking_venue: data.has("seeking_venue"),
            seeking_description: optional(data, "seeking_description"),
        };

        check_state(&form.state, &mut errors);
        check_phone(&form.phone, &mut errors);
        check_link("image_link", &form.image_link, &mut errors);
        check_link("facebook_link", &form.facebook_link, &mut errors);
        check_link("website_link", &form.website_link, &mut errors);

        (form, errors)
    }

    pub fn from_model(model: artist::Model) -> Self {
        Self {
            name: model.name,
            city: model.city,
            state: model.state,
            phone: model.phone,
            genres: genres::split(&model.genres),
            image_link: model.image_link,
            facebook_link: model.facebook_link,
            website_link: model.website_link,
            seeking_venue: model.seeking_venue,
            seeking_description: model.seeking_description,
        }
    }
}

/// A show submission as typed; [`ShowForm::validate`] yields the typed row.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ShowForm {
    pub artist_id: String,
    pub venue_id: String,
    pub start_time: String,
}

/// A validated show ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShow {
    pub artist_id: i32,
    pub venue_id: i32,
    pub start_time: NaiveDateTime,
}

impl ShowForm {
    pub fn from_form(data: &FormData) -> Self {
        Self {
            artist_id: data.get("artist_id").unwrap_or_default().trim().to_string(),
            venue_id: data.get("venue_id").unwrap_or_default().trim().to_string(),
            start_time: data.get("start_time").unwrap_or_default().trim().to_string(),
        }
    }

    pub fn validate(&self) -> Result<NewShow, FormErrors> {
        let mut errors = FormErrors::default();

        let artist_id = parse_id("artist_id", &self.artist_id, &mut errors);
        let venue_id = parse_id("venue_id", &self.venue_id, &mut errors);

        let start_time = if self.start_time.is_empty() {
            errors.add("start_time", "this field is required");
            None
        } else {
            let parsed = parse_start_time(&self.start_time);
            if parsed.is_none() {
                errors.add("start_time", "not a valid timestamp");
            }
            parsed
        };

        // All three are Some exactly when no errors were recorded.
        match (artist_id, venue_id, start_time) {
            (Some(artist_id), Some(venue_id), Some(start_time)) => Ok(NewShow {
                artist_id,
                venue_id,
                start_time,
            }),
            _ => Err(errors),
        }
    }
}

fn parse_id(field: &str, value: &str, errors: &mut FormErrors) -> Option<i32> {
    if value.is_empty() {
        errors.add(field, "this field is required");
        return None;
    }
    match value.parse::<i32>() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, "must be a whole number");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(pairs: &[(&str, &str)]) -> Vec<u8> {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in pairs {
            serializer.append_pair(k, v);
        }
        serializer.finish().into_bytes()
    }

    fn venue_pairs<'a>() -> Vec<(&'a str, &'a str)> {
        vec![
            ("name", "The Musical Hop"),
            ("city", "San Francisco"),
            ("state", "CA"),
            ("address", "1015 Folsom Street"),
            ("phone", "123-123-1234"),
            ("genres", "Jazz"),
            ("genres", "Reggae"),
            ("genres", "Swing"),
            ("image_link", "https://images.example.com/hop.jpg"),
            ("facebook_link", "https://www.facebook.com/TheMusicalHop"),
            ("website_link", "https://www.themusicalhop.com"),
            ("seeking_talent", "y"),
            ("seeking_description", "Looking for a local artist."),
        ]
    }

    #[test]
    fn test_form_data_repeated_keys() {
        let data = FormData::parse(&encode(&[("genres", "Jazz"), ("genres", "Folk")]));
        assert_eq!(data.get("genres"), Some("Jazz"));
        assert_eq!(data.get_all("genres"), vec!["Jazz", "Folk"]);
        assert!(!data.has("seeking_talent"));
    }

    #[test]
    fn test_venue_form_valid() {
        let data = FormData::parse(&encode(&venue_pairs()));
        let (form, errors) = VenueForm::from_form(&data);
        assert!(errors.is_empty(), "unexpected errors: {}", errors.summary());
        assert_eq!(form.name, "The Musical Hop");
        assert_eq!(form.genres, vec!["Jazz", "Reggae", "Swing"]);
        assert!(form.seeking_talent);
        assert_eq!(form.phone.as_deref(), Some("123-123-1234"));
    }

    #[test]
    fn test_venue_form_missing_required_fields() {
        let data = FormData::parse(&encode(&[("city", "San Francisco")]));
        let (form, errors) = VenueForm::from_form(&data);
        assert!(errors.contains("name"));
        assert!(errors.contains("state"));
        assert!(errors.contains("address"));
        assert!(!errors.contains("city"));
        assert_eq!(form.city, "San Francisco");
    }

    #[test]
    fn test_venue_form_unknown_state_code() {
        let mut pairs = venue_pairs();
        pairs[2] = ("state", "XX");
        let data = FormData::parse(&encode(&pairs));
        let (_, errors) = VenueForm::from_form(&data);
        assert!(errors.contains("state"));
    }

    #[test]
    fn test_venue_form_rejects_non_http_link() {
        let mut pairs = venue_pairs();
        pairs[10] = ("website_link", "not a url");
        let data = FormData::parse(&encode(&pairs));
        let (_, errors) = VenueForm::from_form(&data);
        assert!(errors.contains("website_link"));

        let mut pairs = venue_pairs();
        pairs[10] = ("website_link", "ftp://example.com/x");
        let data = FormData::parse(&encode(&pairs));
        let (_, errors) = VenueForm::from_form(&data);
        assert!(errors.contains("website_link"));
    }

    #[test]
    fn test_venue_form_rejects_alphabetic_phone() {
        let mut pairs = venue_pairs();
        pairs[4] = ("phone", "call me maybe");
        let data = FormData::parse(&encode(&pairs));
        let (_, errors) = VenueForm::from_form(&data);
        assert!(errors.contains("phone"));
    }

    #[test]
    fn test_unchecked_seeking_flag_is_false() {
        let pairs: Vec<_> = venue_pairs()
            .into_iter()
            .filter(|(k, _)| *k != "seeking_talent")
            .collect();
        let data = FormData::parse(&encode(&pairs));
        let (form, errors) = VenueForm::from_form(&data);
        assert!(errors.is_empty());
        assert!(!form.seeking_talent);
    }

    #[test]
    fn test_artist_form_valid_without_address() {
        let data = FormData::parse(&encode(&[
            ("name", "Guns N Petals"),
            ("city", "San Francisco"),
            ("state", "CA"),
            ("genres", "Rock n Roll"),
        ]));
        let (form, errors) = ArtistForm::from_form(&data);
        assert!(errors.is_empty(), "unexpected errors: {}", errors.summary());
        assert_eq!(form.genres, vec!["Rock n Roll"]);
        assert!(!form.seeking_venue);
    }

    #[test]
    fn test_show_form_valid() {
        let data = FormData::parse(&encode(&[
            ("artist_id", "4"),
            ("venue_id", "1"),
            ("start_time", "2035-04-01 20:00:00"),
        ]));
        let show = ShowForm::from_form(&data).validate().unwrap();
        assert_eq!(show.artist_id, 4);
        assert_eq!(show.venue_id, 1);
        assert_eq!(
            show.start_time,
            parse_start_time("2035-04-01 20:00:00").unwrap()
        );
    }

    #[test]
    fn test_show_form_accepts_datetime_local() {
        let data = FormData::parse(&encode(&[
            ("artist_id", "4"),
            ("venue_id", "1"),
            ("start_time", "2035-04-01T20:00"),
        ]));
        assert!(ShowForm::from_form(&data).validate().is_ok());
    }

    #[test]
    fn test_show_form_rejects_bad_ids_and_timestamp() {
        let data = FormData::parse(&encode(&[
            ("artist_id", "four"),
            ("venue_id", ""),
            ("start_time", "next tuesday"),
        ]));
        let errors = ShowForm::from_form(&data).validate().unwrap_err();
        assert!(errors.contains("artist_id"));
        assert!(errors.contains("venue_id"));
        assert!(errors.contains("start_time"));
    }

    #[test]
    fn test_form_errors_summary() {
        let mut errors = FormErrors::default();
        errors.add("name", "this field is required");
        errors.add("state", "not a valid state code");
        assert_eq!(
            errors.summary(),
            "name: this field is required; state: not a valid state code"
        );
    }
}

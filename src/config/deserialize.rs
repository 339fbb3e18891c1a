// ABOUTME: Custom serde deserializers for registry fields.
// ABOUTME: Durations accept plain seconds or humantime strings and keep their sign for validation.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DurationValue {
    Seconds(i64),
    Text(String),
}

/// Deserialize a duration into signed milliseconds.
///
/// `30`, `"30s"` and `"1m 30s"` are all accepted. Negative values survive
/// deserialization so the registry can reject them with a precise error.
pub fn deserialize_signed_millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match DurationValue::deserialize(deserializer)? {
        DurationValue::Seconds(secs) => secs
            .checked_mul(1000)
            .ok_or_else(|| serde::de::Error::custom("duration out of range")),
        DurationValue::Text(text) => {
            let text = text.trim();
            let (negative, body) = match text.strip_prefix('-') {
                Some(rest) => (true, rest.trim_start()),
                None => (false, text),
            };
            let duration = humantime::parse_duration(body).map_err(serde::de::Error::custom)?;
            let millis = i64::try_from(duration.as_millis())
                .map_err(|_| serde::de::Error::custom("duration out of range"))?;
            Ok(if negative { -millis } else { millis })
        }
    }
}

/// Deserialize an argv list, accepting a single string as shorthand for
/// whitespace-separated arguments.
pub fn deserialize_argv<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Argv {
        Line(String),
        List(Vec<String>),
    }

    Ok(match Argv::deserialize(deserializer)? {
        Argv::Line(line) => line.split_whitespace().map(str::to_string).collect(),
        Argv::List(list) => list,
    })
}

pub fn deserialize_argv_option<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "deserialize_argv")] Vec<String>);

    let opt: Option<Wrapper> = Option::deserialize(deserializer)?;
    Ok(opt.map(|Wrapper(argv)| argv))
}

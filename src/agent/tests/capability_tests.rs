//! Tests for capability sets and pre-dispatch validation.

use crate::agent::domain::{AgentError, PlatformAgent};
use crate::error::{Classify, ErrorKind};
use crate::job::domain::JobType;
use crate::platform::Platform;
use rstest::rstest;
use serde_json::{Map, Value};

fn params(pairs: &[(&str, &str)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(name, value)| ((*name).to_owned(), Value::from(*value)))
        .collect()
}

#[rstest]
#[case(Platform::Facebook, false)]
#[case(Platform::Twitter, true)]
#[case(Platform::Instagram, false)]
fn only_twitter_retweets(#[case] platform: Platform, #[case] supported: bool) {
    let agent = PlatformAgent::for_platform(platform);

    assert_eq!(agent.supports(JobType::Retweet), supported);
    assert!(agent.supports(JobType::Auth));
    assert_eq!(agent.platform(), platform);
}

#[rstest]
fn unsupported_capability_is_a_validation_error() {
    let err = PlatformAgent::Instagram
        .validate(JobType::Retweet, &params(&[("post_url", "https://instagram.com/p/1")]))
        .expect_err("instagram cannot retweet");

    assert!(matches!(
        err,
        AgentError::Unsupported {
            platform: Platform::Instagram,
            capability: JobType::Retweet
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[rstest]
#[case(JobType::Post, &[], "text")]
#[case(JobType::React, &[], "post_url")]
#[case(JobType::Reply, &[("post_url", "https://twitter.com/a/status/1")], "text")]
#[case(JobType::Follow, &[("profile_url", "   ")], "profile_url")]
fn missing_parameters_are_named(
    #[case] capability: JobType,
    #[case] given: &[(&str, &str)],
    #[case] expected: &str,
) {
    let err = PlatformAgent::Twitter
        .validate(capability, &params(given))
        .expect_err("validation should fail");

    assert!(matches!(err, AgentError::MissingParam(ref name) if name == expected));
}

#[rstest]
#[case(Platform::Twitter, 280, true)]
#[case(Platform::Twitter, 281, false)]
#[case(Platform::Instagram, 2_200, true)]
#[case(Platform::Instagram, 2_201, false)]
fn text_limits_are_enforced_per_platform(
    #[case] platform: Platform,
    #[case] length: usize,
    #[case] accepted: bool,
) {
    let text = "x".repeat(length);
    let result = PlatformAgent::for_platform(platform).validate(JobType::Post, &params(&[("text", &text)]));

    assert_eq!(result.is_ok(), accepted);
    if let Err(err) = result {
        assert!(matches!(err, AgentError::TextTooLong { length: l, .. } if l == length));
    }
}

#[rstest]
fn text_length_counts_characters_not_bytes() {
    let text = "é".repeat(280);

    let result = PlatformAgent::Twitter.validate(JobType::Post, &params(&[("text", &text)]));

    assert!(result.is_ok());
}

#[rstest]
#[case(JobType::Auth, "auth")]
#[case(JobType::Retweet, "retweet")]
fn workflow_names_follow_capabilities(#[case] capability: JobType, #[case] name: &str) {
    assert_eq!(PlatformAgent::workflow_name(capability), name);
}

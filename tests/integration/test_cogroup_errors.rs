// Copyright © 2024 Pathway

use assert_matches::assert_matches;

use cogroup_engine::engine::error::DynError;
use cogroup_engine::engine::{CoGroup, Error, OutputPair, Phase, Port};

use super::helpers::{keyed_cogroup, values};

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("malformed record {0:?}")]
struct MalformedRecord(String);

fn parse_key(record: &String) -> Result<i32, DynError> {
    let (key, _) = record
        .split_once(':')
        .ok_or_else(|| MalformedRecord(record.clone()))?;
    Ok(key.parse()?)
}

fn parsing_cogroup() -> CoGroup<String, String, i32> {
    CoGroup::try_new(parse_key, parse_key)
}

#[test]
fn test_left_after_right() -> eyre::Result<()> {
    let mut cogroup = keyed_cogroup();
    cogroup.push_left((1, "a"))?;
    cogroup.push_right((1, "x"))?;

    let line = line!() + 1;
    let error = cogroup.push_left((1, "late")).unwrap_err();
    assert_matches!(
        error,
        Error::OrderingViolation {
            port: Port::Left,
            phase: Phase::AcceptingRight,
            location,
        } => {
            assert_eq!(location.file(), file!());
            assert_eq!(location.line(), line);
        }
    );

    // the late record was never buffered
    let matches = values(cogroup.push_right((1, "y"))?);
    assert_eq!(matches, vec![OutputPair::Both("a", "y")]);
    Ok(())
}

#[test]
fn test_left_after_completion() -> eyre::Result<()> {
    let mut cogroup = keyed_cogroup();
    cogroup.push_left((1, "a"))?;
    cogroup.complete()?;

    assert_matches!(
        cogroup.push_left((2, "b")),
        Err(Error::OrderingViolation {
            port: Port::Left,
            phase: Phase::Completed,
            ..
        })
    );
    Ok(())
}

#[test]
fn test_right_after_completion() -> eyre::Result<()> {
    let mut cogroup = keyed_cogroup();
    cogroup.push_left((1, "a"))?;
    cogroup.push_right((1, "x"))?;
    cogroup.complete()?;

    assert_matches!(
        cogroup.push_right((1, "y")),
        Err(Error::OrderingViolation {
            port: Port::Right,
            phase: Phase::Completed,
            ..
        })
    );
    Ok(())
}

#[test]
fn test_duplicate_completion() -> eyre::Result<()> {
    let mut cogroup = keyed_cogroup();
    cogroup.push_left((1, "a"))?;
    assert_eq!(cogroup.complete()?.count(), 1);

    let error = cogroup.complete().unwrap_err();
    assert_matches!(error, Error::DuplicateCompletion { .. });
    assert!(error.is_fatal());
    Ok(())
}

#[test]
fn test_ordering_violation_message() -> eyre::Result<()> {
    let mut cogroup = keyed_cogroup();
    cogroup.push_right((1, "x"))?;

    let message = cogroup.push_left((1, "a")).unwrap_err().to_string();
    assert!(message.starts_with("record on port 0 (left) received while accepting right records"));
    assert!(message.contains(file!()));
    Ok(())
}

#[test]
fn test_left_key_failure() -> eyre::Result<()> {
    let mut cogroup = parsing_cogroup();
    cogroup.push_left("1:a".to_string())?;

    let error = cogroup.push_left("no key".to_string()).unwrap_err();
    assert!(!error.is_fatal());
    assert_matches!(
        error,
        Error::KeyExtraction {
            port: Port::Left,
            source,
        } => {
            assert_eq!(
                source.downcast_ref::<MalformedRecord>(),
                Some(&MalformedRecord("no key".to_string()))
            );
        }
    );
    assert_matches!(
        cogroup.push_left("x:b".to_string()),
        Err(Error::KeyExtraction { port: Port::Left, .. })
    );
    assert_eq!(cogroup.phase(), Phase::AcceptingLeft);

    cogroup.push_left("2:c".to_string())?;
    assert_eq!(cogroup.stats().left_records, 2);

    let drained: Vec<_> = cogroup.complete()?.collect();
    assert_eq!(
        drained,
        vec![
            OutputPair::LeftOnly("1:a".to_string()),
            OutputPair::LeftOnly("2:c".to_string()),
        ]
    );
    Ok(())
}

#[test]
fn test_right_key_failure_seals_left() -> eyre::Result<()> {
    let mut cogroup = parsing_cogroup();
    cogroup.push_left("1:a".to_string())?;

    assert_matches!(
        cogroup.push_right("broken".to_string()),
        Err(Error::KeyExtraction { port: Port::Right, .. })
    );
    assert_eq!(cogroup.phase(), Phase::AcceptingRight);
    assert_matches!(
        cogroup.push_left("2:b".to_string()),
        Err(Error::OrderingViolation { .. })
    );

    let matches: Vec<_> = cogroup.push_right("1:x".to_string())?.collect();
    assert_eq!(
        matches,
        vec![OutputPair::Both("1:a".to_string(), "1:x".to_string())]
    );
    assert_eq!(cogroup.stats().right_records, 1);
    Ok(())
}

#[test]
fn test_downcast_other() {
    let error = Error::from(DynError::from(MalformedRecord("?".to_string())));
    assert_eq!(
        error.downcast::<MalformedRecord>().unwrap(),
        MalformedRecord("?".to_string())
    );

    let error = Error::from(DynError::from(Error::NeedsShards));
    assert_matches!(error, Error::NeedsShards);
}

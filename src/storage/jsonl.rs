//! JSONL (JSON Lines) storage.
//!
//! JSONL is the source of truth for every league row.
//! Each line is a valid JSON object representing one entity. Lines that fail
//! validation are logged and skipped on read, and written back unchanged
//! whenever the file is rewritten.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::PathBuf;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::{StorageConfig, StorageError};
use crate::models::{Participant, ParticipantId, Season, Segment, Submission, Week, WeekId};

/// Entity types for JSONL storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    Participant,
    Segment,
    Season,
    Week,
    Submission,
}

impl EntityType {
    /// Get the filename for this entity type.
    pub fn filename(&self) -> &'static str {
        match self {
            EntityType::Participant => "participants.jsonl",
            EntityType::Segment => "segments.jsonl",
            EntityType::Season => "seasons.jsonl",
            EntityType::Week => "weeks.jsonl",
            EntityType::Submission => "submissions.jsonl",
        }
    }
}

/// Rows read from one file.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonlRows<T> {
    pub rows: Vec<T>,

    /// Raw text of lines that failed to parse or validate
    pub rejected: Vec<String>,
}

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    /// Create a new JSONL writer for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a writer for a specific entity type.
    pub fn for_entity(config: &StorageConfig, entity: EntityType) -> Self {
        Self::new(config.entity_path(entity))
    }

    /// Ensure the parent directory exists.
    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Write entities, replacing the entire file.
    pub fn write_all(&self, entities: &[T]) -> Result<usize, StorageError> {
        self.write_rows(entities, &[])
    }

    /// Replace the file with `preserved` raw lines followed by `entities`.
    ///
    /// The new contents go to a sibling temp file which is then renamed over
    /// the original, so readers see either the old file or the new one.
    /// Returns the number of entities written.
    pub fn write_rows(&self, entities: &[T], preserved: &[String]) -> Result<usize, StorageError> {
        self.ensure_dir()?;

        let tmp_path = self.path.with_extension("jsonl.tmp");
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);

        if !preserved.is_empty() {
            warn!(
                "Keeping {} unreadable lines in {:?}",
                preserved.len(),
                self.path
            );
        }
        for line in preserved {
            writeln!(writer, "{}", line)?;
        }

        let mut count = 0;
        for entity in entities {
            let json = serde_json::to_string(entity)?;
            writeln!(writer, "{}", json)?;
            count += 1;
        }

        writer.flush()?;
        writer.get_ref().sync_all()?;
        drop(writer);
        fs::rename(&tmp_path, &self.path)?;

        info!("Wrote {} entities to {:?}", count, self.path);
        Ok(count)
    }
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    /// Create a new JSONL reader for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a reader for a specific entity type.
    pub fn for_entity(config: &StorageConfig, entity: EntityType) -> Self {
        Self::new(config.entity_path(entity))
    }

    /// Read all valid entities from the file.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        Ok(self.read_with_rejects()?.rows)
    }

    /// Read valid entities and keep the raw text of every rejected line.
    pub fn read_with_rejects(&self) -> Result<JsonlRows<T>, StorageError> {
        let mut loaded = JsonlRows {
            rows: Vec::new(),
            rejected: Vec::new(),
        };
        if !self.path.exists() {
            return Ok(loaded);
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str(&line) {
                Ok(entity) => loaded.rows.push(entity),
                Err(e) => {
                    warn!(
                        "Rejected line {} in {:?}: {}",
                        idx + 1,
                        self.path,
                        e
                    );
                    loaded.rejected.push(line);
                }
            }
        }

        debug!("Read {} entities from {:?}", loaded.rows.len(), self.path);
        Ok(loaded)
    }
}

pub fn read_participants(config: &StorageConfig) -> Result<Vec<Participant>, StorageError> {
    JsonlReader::for_entity(config, EntityType::Participant).read_all()
}

pub fn read_segments(config: &StorageConfig) -> Result<Vec<Segment>, StorageError> {
    JsonlReader::for_entity(config, EntityType::Segment).read_all()
}

pub fn read_seasons(config: &StorageConfig) -> Result<Vec<Season>, StorageError> {
    JsonlReader::for_entity(config, EntityType::Season).read_all()
}

/// Read weeks sorted by start.
pub fn read_weeks(config: &StorageConfig) -> Result<Vec<Week>, StorageError> {
    let mut weeks: Vec<Week> = JsonlReader::for_entity(config, EntityType::Week).read_all()?;
    weeks.sort_by_key(|w| w.window.start);
    Ok(weeks)
}

/// Read submissions, at most one per (participant, week).
///
/// When a key appears on several lines the last one wins.
pub fn read_submissions(config: &StorageConfig) -> Result<Vec<Submission>, StorageError> {
    Ok(load_submissions(config)?.rows)
}

fn load_submissions(config: &StorageConfig) -> Result<JsonlRows<Submission>, StorageError> {
    let mut loaded = JsonlReader::for_entity(config, EntityType::Submission).read_with_rejects()?;
    loaded.rows = dedupe_submissions(loaded.rows);
    Ok(loaded)
}

fn dedupe_submissions(rows: Vec<Submission>) -> Vec<Submission> {
    let mut latest: HashMap<(ParticipantId, WeekId), usize> = HashMap::new();
    for (idx, submission) in rows.iter().enumerate() {
        let (participant_id, week_id) = submission.key();
        if latest
            .insert((participant_id.clone(), week_id.clone()), idx)
            .is_some()
        {
            warn!(
                "Duplicate submission for participant {} week {}, keeping the later row",
                participant_id, week_id
            );
        }
    }

    rows.into_iter()
        .enumerate()
        .filter(|(idx, submission)| {
            let (participant_id, week_id) = submission.key();
            latest.get(&(participant_id.clone(), week_id.clone())) == Some(idx)
        })
        .map(|(_, submission)| submission)
        .collect()
}

/// Insert or update a participant by id.
pub fn upsert_participant(
    config: &StorageConfig,
    participant: Participant,
) -> Result<(), StorageError> {
    let mut loaded =
        JsonlReader::<Participant>::for_entity(config, EntityType::Participant).read_with_rejects()?;
    loaded.rows.retain(|p| p.id != participant.id);
    loaded.rows.push(participant);
    JsonlWriter::for_entity(config, EntityType::Participant)
        .write_rows(&loaded.rows, &loaded.rejected)?;
    Ok(())
}

/// Replace a participant's submission for a week.
///
/// The prior record, its efforts and its result are dropped and the new
/// submission written in a single file replacement. Returns the replaced
/// submission, if any.
pub fn replace_submission(
    config: &StorageConfig,
    submission: Submission,
) -> Result<Option<Submission>, StorageError> {
    let mut loaded = load_submissions(config)?;
    let (participant_id, week_id) = submission.key();
    let previous = loaded
        .rows
        .iter()
        .position(|s| s.key() == (participant_id, week_id))
        .map(|idx| loaded.rows.remove(idx));

    info!(
        "Storing submission for participant {} week {} ({}s, replaced: {})",
        participant_id,
        week_id,
        submission.result.total_seconds,
        previous.is_some()
    );

    loaded.rows.push(submission);
    JsonlWriter::for_entity(config, EntityType::Submission)
        .write_rows(&loaded.rows, &loaded.rejected)?;
    Ok(previous)
}

/// Outcome of deleting a participant's data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemovalSummary {
    pub participant_removed: bool,
    pub submissions_removed: usize,
}

/// Delete a participant and every submission they made.
pub fn remove_participant(
    config: &StorageConfig,
    participant_id: &ParticipantId,
) -> Result<RemovalSummary, StorageError> {
    let mut submissions = load_submissions(config)?;
    let before = submissions.rows.len();
    submissions
        .rows
        .retain(|s| &s.result.participant_id != participant_id);
    let submissions_removed = before - submissions.rows.len();
    if submissions_removed > 0 {
        JsonlWriter::for_entity(config, EntityType::Submission)
            .write_rows(&submissions.rows, &submissions.rejected)?;
    }

    let mut participants =
        JsonlReader::<Participant>::for_entity(config, EntityType::Participant).read_with_rejects()?;
    let before = participants.rows.len();
    participants.rows.retain(|p| &p.id != participant_id);
    let participant_removed = participants.rows.len() != before;
    if participant_removed {
        JsonlWriter::for_entity(config, EntityType::Participant)
            .write_rows(&participants.rows, &participants.rejected)?;
    }

    info!(
        "Removed participant {}: {} submissions",
        participant_id, submissions_removed
    );
    Ok(RemovalSummary {
        participant_removed,
        submissions_removed,
    })
}

/// Change a week's scoring multiplier. Returns false when the week is unknown.
pub fn set_week_multiplier(
    config: &StorageConfig,
    week_id: &WeekId,
    multiplier: u32,
) -> Result<bool, StorageError> {
    let mut loaded = JsonlReader::<Week>::for_entity(config, EntityType::Week).read_with_rejects()?;
    let Some(idx) = loaded.rows.iter().position(|w| &w.id == week_id) else {
        return Ok(false);
    };
    loaded.rows[idx] = loaded.rows[idx].clone().with_multiplier(multiplier)?;
    JsonlWriter::for_entity(config, EntityType::Week).write_rows(&loaded.rows, &loaded.rejected)?;
    Ok(true)
}

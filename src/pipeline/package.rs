//! Deck packaging: validated cards → one Anki `.apkg` file.
//!
//! An `.apkg` is a zip archive with two entries:
//!
//! ```text
//! deck.apkg
//!  ├─ collection.anki2   SQLite database, collection schema v11
//!  └─ media              JSON object mapping media files ({} here)
//! ```
//!
//! The collection holds one note type ([`CARD_MODEL_ID`], "Simple Model"),
//! one deck with a random id, and one note + one card per flashcard. Notes get
//! strictly increasing ids so their order in the file is the order of the
//! card list.
//!
//! Everything here is blocking (SQLite, zip); the pipeline calls it from
//! `spawn_blocking`.

use crate::error::Pdf2AnkiError;
use crate::pipeline::cards::{CardList, Flashcard};
use rand::Rng;
use rusqlite::{params, Connection};
use serde_json::{json, Map, Value};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Fixed note-type id. Re-importing a deck updates the same note type.
pub const CARD_MODEL_ID: i64 = 1_607_392_321;

pub const CARD_MODEL_NAME: &str = "Simple Model";

const CARD_TEMPLATE_NAME: &str = "Card 1";

const QUESTION_FORMAT: &str = r#"<div class="card-content">
  {{Question}}
</div>"#;

const ANSWER_FORMAT: &str = r#"<div class="card-content">
  {{FrontSide}}
  <hr>
  {{Answer}}
</div>"#;

const CARD_CSS: &str = r#".card-content {
    font-family: "Calibri", sans-serif;
    font-size: 20px;
    font-weight: bold;
    color: silver;
    text-align: center;
    margin: 20px auto;
}

hr {
    border: 0;
    height: 1px;
    background: silver;
    margin: 20px 0;
}"#;

/// Lower bound (inclusive) of generated deck ids.
pub const DECK_ID_MIN: i64 = 1 << 30;
/// Upper bound (exclusive) of generated deck ids.
pub const DECK_ID_MAX: i64 = 1 << 31;

const COLLECTION_ENTRY: &str = "collection.anki2";
const MEDIA_ENTRY: &str = "media";
const FIELD_SEPARATOR: char = '\x1f';

const SCHEMA: &str = r#"
CREATE TABLE col (
    id      integer primary key,
    crt     integer not null,
    mod     integer not null,
    scm     integer not null,
    ver     integer not null,
    dty     integer not null,
    usn     integer not null,
    ls      integer not null,
    conf    text not null,
    models  text not null,
    decks   text not null,
    dconf   text not null,
    tags    text not null
);
CREATE TABLE notes (
    id      integer primary key,
    guid    text not null,
    mid     integer not null,
    mod     integer not null,
    usn     integer not null,
    tags    text not null,
    flds    text not null,
    sfld    integer not null,
    csum    integer not null,
    flags   integer not null,
    data    text not null
);
CREATE TABLE cards (
    id      integer primary key,
    nid     integer not null,
    did     integer not null,
    ord     integer not null,
    mod     integer not null,
    usn     integer not null,
    type    integer not null,
    queue   integer not null,
    due     integer not null,
    ivl     integer not null,
    factor  integer not null,
    reps    integer not null,
    lapses  integer not null,
    left    integer not null,
    odue    integer not null,
    odid    integer not null,
    flags   integer not null,
    data    text not null
);
CREATE TABLE revlog (
    id      integer primary key,
    cid     integer not null,
    usn     integer not null,
    ease    integer not null,
    ivl     integer not null,
    lastIvl integer not null,
    factor  integer not null,
    time    integer not null,
    type    integer not null
);
CREATE TABLE graves (
    usn     integer not null,
    oid     integer not null,
    type    integer not null
);
CREATE INDEX ix_notes_usn ON notes (usn);
CREATE INDEX ix_cards_usn ON cards (usn);
CREATE INDEX ix_revlog_usn ON revlog (usn);
CREATE INDEX ix_cards_nid ON cards (nid);
CREATE INDEX ix_cards_sched ON cards (did, queue, due);
CREATE INDEX ix_revlog_cid ON revlog (cid);
CREATE INDEX ix_notes_csum ON notes (csum);
"#;

/// Draw a deck id uniformly from `[2^30, 2^31)`.
pub fn random_deck_id<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    rng.gen_range(DECK_ID_MIN..DECK_ID_MAX)
}

/// File-name-safe form of a deck name.
///
/// Characters outside `[A-Za-z0-9 _.-]` become `_`. A name with nothing
/// usable left falls back to [`crate::config::DEFAULT_DECK_NAME`].
pub fn sanitize_file_stem(deck_name: &str) -> String {
    let stem: String = deck_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.trim_matches(|c| c == '.' || c == ' ').is_empty() {
        crate::config::DEFAULT_DECK_NAME.to_string()
    } else {
        stem
    }
}

/// Write `cards` as the deck `deck_name` to `<out_dir>/<deck name>.apkg`.
///
/// The archive is assembled as `<name>.apkg.tmp` and renamed into place, so
/// a failed run never leaves a partial package behind.
///
/// # Errors
/// * [`Pdf2AnkiError::EmptyDeck`] — `cards` is empty; no file is created
/// * [`Pdf2AnkiError::Packaging`] — SQLite or zip failure, or a field that
///   contains the `\x1f` field separator
/// * [`Pdf2AnkiError::PackageWriteFailed`] — file-system failure
pub fn package_deck(
    cards: &CardList,
    deck_name: &str,
    deck_id: i64,
    out_dir: &Path,
) -> Result<PathBuf, Pdf2AnkiError> {
    if cards.is_empty() {
        return Err(Pdf2AnkiError::EmptyDeck);
    }
    if let Some(index) = cards
        .iter()
        .position(|c| c.front.contains(FIELD_SEPARATOR) || c.back.contains(FIELD_SEPARATOR))
    {
        return Err(Pdf2AnkiError::Packaging(format!(
            "card #{index} contains the note field separator"
        )));
    }

    let write_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| Pdf2AnkiError::PackageWriteFailed { path, source }
    };

    std::fs::create_dir_all(out_dir).map_err(write_err(out_dir))?;
    let out_path = out_dir.join(format!("{}.apkg", sanitize_file_stem(deck_name)));
    let tmp_path = out_path.with_extension("apkg.tmp");

    // The collection is built in its own scratch directory; SQLite needs a path.
    let scratch = tempfile::tempdir().map_err(write_err(out_dir))?;
    let db_path = scratch.path().join(COLLECTION_ENTRY);
    build_collection(&db_path, cards, deck_name, deck_id)?;
    let collection = std::fs::read(&db_path).map_err(write_err(&db_path))?;

    let result = write_archive(&tmp_path, &collection)
        .and_then(|()| std::fs::rename(&tmp_path, &out_path).map_err(write_err(&out_path)));
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    result?;

    info!(
        "Packaged {} cards into deck '{}' (id {}) → {}",
        cards.len(),
        deck_name,
        deck_id,
        out_path.display()
    );
    Ok(out_path)
}

fn write_archive(path: &Path, collection: &[u8]) -> Result<(), Pdf2AnkiError> {
    let file = File::create(path).map_err(|source| Pdf2AnkiError::PackageWriteFailed {
        path: path.to_path_buf(),
        source,
    })?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(COLLECTION_ENTRY, options)?;
    zip.write_all(collection)
        .map_err(|e| Pdf2AnkiError::Packaging(format!("zip: {e}")))?;
    zip.start_file(MEDIA_ENTRY, options)?;
    zip.write_all(b"{}")
        .map_err(|e| Pdf2AnkiError::Packaging(format!("zip: {e}")))?;
    zip.finish()?;
    Ok(())
}

fn build_collection(
    db_path: &Path,
    cards: &CardList,
    deck_name: &str,
    deck_id: i64,
) -> Result<(), Pdf2AnkiError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| Pdf2AnkiError::Internal(format!("system clock: {e}")))?;
    let now_secs = now.as_secs() as i64;
    let now_ms = now.as_millis() as i64;

    let mut conn = Connection::open(db_path)?;
    conn.execute_batch(SCHEMA)?;

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO col (id, crt, mod, scm, ver, dty, usn, ls, conf, models, decks, dconf, tags)
         VALUES (1, ?1, ?2, ?2, 11, 0, 0, 0, ?3, ?4, ?5, ?6, '{}')",
        params![
            now_secs,
            now_ms,
            collection_conf(deck_id).to_string(),
            models_json(deck_id, now_secs).to_string(),
            decks_json(deck_name, deck_id, now_secs).to_string(),
            dconf_json().to_string(),
        ],
    )?;

    for (index, card) in cards.iter().enumerate() {
        let note_id = now_ms + index as i64;
        let flds = format!("{}{}{}", card.front, FIELD_SEPARATOR, card.back);
        tx.execute(
            "INSERT INTO notes (id, guid, mid, mod, usn, tags, flds, sfld, csum, flags, data)
             VALUES (?1, ?2, ?3, ?4, -1, '', ?5, ?6, ?7, 0, '')",
            params![
                note_id,
                note_guid(card),
                CARD_MODEL_ID,
                now_secs,
                flds,
                card.front,
                field_checksum(&card.front),
            ],
        )?;
        tx.execute(
            "INSERT INTO cards (id, nid, did, ord, mod, usn, type, queue, due,
                                ivl, factor, reps, lapses, left, odue, odid, flags, data)
             VALUES (?1, ?1, ?2, 0, ?3, -1, 0, 0, ?4, 0, 0, 0, 0, 0, 0, 0, 0, '')",
            params![note_id, deck_id, now_secs, index as i64 + 1],
        )?;
    }
    tx.commit()?;

    debug!("Wrote {} notes to {}", cards.len(), db_path.display());
    Ok(())
}

fn collection_conf(deck_id: i64) -> Value {
    json!({
        "activeDecks": [deck_id],
        "curDeck": deck_id,
        "newSpread": 0,
        "collapseTime": 1200,
        "timeLim": 0,
        "estTimes": true,
        "dueCounts": true,
        "curModel": CARD_MODEL_ID.to_string(),
        "nextPos": 1,
        "sortType": "noteFld",
        "sortBackwards": false,
        "addToCur": true
    })
}

fn models_json(deck_id: i64, now_secs: i64) -> Value {
    let field = |name: &str, ord: u32| {
        json!({
            "name": name,
            "ord": ord,
            "font": "Arial",
            "size": 20,
            "media": [],
            "rtl": false,
            "sticky": false
        })
    };
    let model = json!({
        "id": CARD_MODEL_ID,
        "name": CARD_MODEL_NAME,
        "type": 0,
        "mod": now_secs,
        "usn": -1,
        "sortf": 0,
        "did": deck_id,
        "flds": [field("Question", 0), field("Answer", 1)],
        "tmpls": [{
            "name": CARD_TEMPLATE_NAME,
            "ord": 0,
            "qfmt": QUESTION_FORMAT,
            "afmt": ANSWER_FORMAT,
            "bqfmt": "",
            "bafmt": "",
            "did": null
        }],
        "css": CARD_CSS,
        "latexPre": "\\documentclass[12pt]{article}\n\\special{papersize=3in,5in}\n\\usepackage[utf8]{inputenc}\n\\usepackage{amssymb,amsmath}\n\\pagestyle{empty}\n\\setlength{\\parindent}{0in}\n\\begin{document}\n",
        "latexPost": "\\end{document}",
        "req": [[0, "all", [0]]],
        "tags": [],
        "vers": []
    });
    keyed_by_id(CARD_MODEL_ID, model)
}

fn decks_json(deck_name: &str, deck_id: i64, now_secs: i64) -> Value {
    let deck = |id: i64, name: &str| {
        json!({
            "id": id,
            "name": name,
            "desc": "",
            "mod": now_secs,
            "usn": -1,
            "dyn": 0,
            "conf": 1,
            "collapsed": false,
            "extendNew": 10,
            "extendRev": 50,
            "newToday": [0, 0],
            "revToday": [0, 0],
            "lrnToday": [0, 0],
            "timeToday": [0, 0]
        })
    };
    let mut decks = Map::new();
    decks.insert("1".to_string(), deck(1, "Default"));
    decks.insert(deck_id.to_string(), deck(deck_id, deck_name));
    Value::Object(decks)
}

fn dconf_json() -> Value {
    let conf = json!({
        "id": 1,
        "name": "Default",
        "mod": 0,
        "usn": 0,
        "maxTaken": 60,
        "autoplay": true,
        "timer": 0,
        "replayq": true,
        "dyn": false,
        "new": {
            "delays": [1, 10],
            "ints": [1, 4, 7],
            "initialFactor": 2500,
            "order": 1,
            "perDay": 20,
            "bury": true,
            "separate": true
        },
        "rev": {
            "perDay": 100,
            "ease4": 1.3,
            "fuzz": 0.05,
            "ivlFct": 1,
            "maxIvl": 36500,
            "bury": true,
            "minSpace": 1
        },
        "lapse": {
            "delays": [10],
            "mult": 0,
            "minInt": 1,
            "leechFails": 8,
            "leechAction": 0
        }
    });
    keyed_by_id(1, conf)
}

fn keyed_by_id(id: i64, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(id.to_string(), value);
    Value::Object(map)
}

const GUID_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!#$%&()*+,-./:;<=>?@[]^_`{|}~";

/// Stable note guid: base-91 of the first 8 bytes of SHA-256 over the fields.
fn note_guid(card: &Flashcard) -> String {
    let digest = Sha256::new()
        .chain_update(card.front.as_bytes())
        .chain_update([FIELD_SEPARATOR as u8])
        .chain_update(card.back.as_bytes())
        .finalize();
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    let mut n = u64::from_be_bytes(prefix);

    let base = GUID_ALPHABET.len() as u64;
    let mut out = Vec::new();
    loop {
        out.push(GUID_ALPHABET[(n % base) as usize]);
        n /= base;
        if n == 0 {
            break;
        }
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Duplicate-detection checksum: first 8 hex digits of SHA-1(field) as an integer.
fn field_checksum(field: &str) -> i64 {
    let digest = Sha1::digest(field.as_bytes());
    i64::from(u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]))
}

// ── Reading packages back ────────────────────────────────────────────────────

/// What [`inspect_package`] finds inside an `.apkg`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PackageSummary {
    pub deck_id: i64,
    pub deck_name: String,
    pub model_id: i64,
    /// Notes as flashcards, in insertion order.
    pub cards: CardList,
}

/// Read an `.apkg` written by [`package_deck`].
pub fn inspect_package(path: &Path) -> Result<PackageSummary, Pdf2AnkiError> {
    let file = File::open(path).map_err(|source| Pdf2AnkiError::InputUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let mut archive = ZipArchive::new(file)?;

    let scratch = tempfile::tempdir()
        .map_err(|e| Pdf2AnkiError::Internal(format!("tempdir: {e}")))?;
    let db_path = scratch.path().join(COLLECTION_ENTRY);
    {
        let mut entry = archive.by_name(COLLECTION_ENTRY)?;
        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| Pdf2AnkiError::Packaging(format!("read {COLLECTION_ENTRY}: {e}")))?;
        std::fs::write(&db_path, bytes).map_err(|source| Pdf2AnkiError::PackageWriteFailed {
            path: db_path.clone(),
            source,
        })?;
    }

    let conn = Connection::open(&db_path)?;
    let decks: String = conn.query_row("SELECT decks FROM col", [], |row| row.get(0))?;
    let (deck_id, deck_name) = find_user_deck(&decks)?;

    let model_id: i64 = conn.query_row("SELECT mid FROM notes ORDER BY id LIMIT 1", [], |row| {
        row.get(0)
    })?;

    let mut stmt = conn.prepare("SELECT flds FROM notes ORDER BY id")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let mut cards = Vec::new();
    for flds in rows {
        let flds = flds?;
        let (front, back) = flds.split_once(FIELD_SEPARATOR).ok_or_else(|| {
            Pdf2AnkiError::Packaging(format!("note has malformed fields: {flds:?}"))
        })?;
        cards.push(Flashcard::new(front, back));
    }

    Ok(PackageSummary {
        deck_id,
        deck_name,
        model_id,
        cards: CardList::new(cards),
    })
}

/// The one deck that is not Anki's built-in "Default" (id 1).
fn find_user_deck(decks_json: &str) -> Result<(i64, String), Pdf2AnkiError> {
    let decks: Map<String, Value> = serde_json::from_str(decks_json)
        .map_err(|e| Pdf2AnkiError::Packaging(format!("decks json: {e}")))?;
    decks
        .values()
        .filter_map(|d| Some((d.get("id")?.as_i64()?, d.get("name")?.as_str()?.to_string())))
        .find(|(id, _)| *id != 1)
        .ok_or_else(|| Pdf2AnkiError::Packaging("package contains no deck".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn two_cards() -> CardList {
        CardList::new(vec![Flashcard::new("Q1", "A1"), Flashcard::new("Q2", "A2")])
    }

    #[test]
    fn test_package_round_trip_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = package_deck(&two_cards(), "Biology", 1_234_567_890, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("Biology.apkg"));

        let summary = inspect_package(&path).unwrap();
        assert_eq!(summary.deck_id, 1_234_567_890);
        assert_eq!(summary.deck_name, "Biology");
        assert_eq!(summary.model_id, CARD_MODEL_ID);
        assert_eq!(summary.cards, two_cards());
        assert!(!dir.path().join("Biology.apkg.tmp").exists());
    }

    #[test]
    fn test_package_notes_match_card_count() {
        let dir = tempfile::tempdir().unwrap();
        let cards: CardList = (0..25)
            .map(|i| Flashcard::new(format!("Q{i}"), format!("A{i}")))
            .collect::<Vec<_>>()
            .into();
        let path = package_deck(&cards, "Many", DECK_ID_MIN, dir.path()).unwrap();
        let summary = inspect_package(&path).unwrap();
        assert_eq!(summary.cards.len(), 25);
        assert_eq!(summary.cards.as_slice()[24].back, "A24");
    }

    #[test]
    fn test_empty_deck_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = package_deck(&CardList::default(), "Empty", DECK_ID_MIN, dir.path()).unwrap_err();
        assert!(matches!(err, Pdf2AnkiError::EmptyDeck));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_field_separator_in_card_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let cards = CardList::new(vec![Flashcard::new("Q", "A"), Flashcard::new("Q\u{1f}X", "A")]);
        let err = package_deck(&cards, "Split", DECK_ID_MIN, dir.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Packaging);
        assert!(err.to_string().contains("#1"), "got: {err}");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_failed_rename_leaves_no_package() {
        let dir = tempfile::tempdir().unwrap();
        // A directory squatting on the target name makes the final rename fail.
        std::fs::create_dir(dir.path().join("Deck.apkg")).unwrap();

        let err = package_deck(&two_cards(), "Deck", DECK_ID_MIN, dir.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Packaging);
        assert!(matches!(err, Pdf2AnkiError::PackageWriteFailed { .. }));

        assert!(dir.path().join("Deck.apkg").is_dir());
        assert!(!dir.path().join("Deck.apkg.tmp").exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_out_dir_that_is_a_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("plain.txt");
        std::fs::write(&not_a_dir, b"x").unwrap();

        let err = package_deck(&two_cards(), "Deck", DECK_ID_MIN, &not_a_dir).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Packaging);
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("plain.txt")]);
    }

    #[test]
    fn test_archive_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = package_deck(&two_cards(), "Deck_generated", DECK_ID_MIN, dir.path()).unwrap();
        let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut media = String::new();
        archive
            .by_name(MEDIA_ENTRY)
            .unwrap()
            .read_to_string(&mut media)
            .unwrap();
        assert_eq!(media, "{}");
        assert!(archive.by_name(COLLECTION_ENTRY).is_ok());
    }

    #[test]
    fn test_deck_ids_in_range_and_distinct() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = random_deck_id(&mut rng);
        let b = random_deck_id(&mut rng);
        assert_ne!(a, b);
        for id in [a, b] {
            assert!((DECK_ID_MIN..DECK_ID_MAX).contains(&id));
        }
    }

    #[test]
    fn test_consecutive_packages_get_different_deck_ids() {
        let dir = tempfile::tempdir().unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let first = package_deck(&two_cards(), "Same", random_deck_id(&mut rng), dir.path())
            .and_then(|p| inspect_package(&p))
            .unwrap();
        let second = package_deck(&two_cards(), "Same", random_deck_id(&mut rng), dir.path())
            .and_then(|p| inspect_package(&p))
            .unwrap();
        assert_ne!(first.deck_id, second.deck_id);
        assert_eq!(second.model_id, CARD_MODEL_ID);
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("Deck_generated"), "Deck_generated");
        assert_eq!(sanitize_file_stem("Bio/Chem: ch.1"), "Bio_Chem_ ch.1");
        assert_eq!(sanitize_file_stem("../x"), ".._x");
        assert_eq!(sanitize_file_stem("  "), crate::config::DEFAULT_DECK_NAME);
        assert_eq!(sanitize_file_stem(".."), crate::config::DEFAULT_DECK_NAME);
    }

    #[test]
    fn test_unicode_deck_name_kept_inside_package() {
        let dir = tempfile::tempdir().unwrap();
        let path = package_deck(&two_cards(), "Bio 日本", DECK_ID_MIN, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "Bio __.apkg");
        assert_eq!(inspect_package(&path).unwrap().deck_name, "Bio 日本");
    }

    #[test]
    fn test_guid_and_checksum_are_stable() {
        let card = Flashcard::new("Q", "A");
        assert_eq!(note_guid(&card), note_guid(&card.clone()));
        assert_ne!(note_guid(&card), note_guid(&Flashcard::new("Q", "B")));
        // sha1("Q") starts with c3156e00
        assert_eq!(field_checksum("Q"), 0xc315_6e00);
    }
}

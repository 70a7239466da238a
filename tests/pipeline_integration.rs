//! Integration tests against a local directory layout
//!
//! Tests the full end-to-end flow: YAML config → raw JSON files → Parquet tables

use parquet::file::reader::{FileReader, SerializedFileReader};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use songlake::config::EngineConfig;
use songlake::engine::Engine;
use songlake::pipeline::{NoProgress, Pipeline};
use songlake::{load_pipeline_from_str, Error, Session, StageSelection};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_jsonl(root: &Path, relative: &str, records: &[Value]) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let body: String = records.iter().map(|r| format!("{r}\n")).collect();
    fs::write(path, body).unwrap();
}

/// Raw input laid out the way the public song/log datasets are
fn seed_input(root: &Path) {
    write_jsonl(
        root,
        "song_data/A/A/A/TRAAAAW128F429D538.json",
        &[json!({
            "num_songs": 1,
            "artist_id": "ARD7TVE1187B99BFB1",
            "artist_latitude": null,
            "artist_longitude": null,
            "artist_location": "California - LA",
            "artist_name": "Casual",
            "song_id": "SOMZWCG12A8C13C480",
            "title": "I Didn't Mean To",
            "duration": 218.93179,
            "year": 0
        })],
    );
    write_jsonl(
        root,
        "song_data/A/B/C/TRABCEI128F424C983.json",
        &[json!({
            "num_songs": 1,
            "artist_id": "AR8IEZO1187B99055E",
            "artist_latitude": null,
            "artist_longitude": null,
            "artist_location": "",
            "artist_name": "Marc Shaiman",
            "song_id": "SOINLJW12A8C13314C",
            "title": "City Slickers",
            "duration": 149.86404,
            "year": 2008
        })],
    );
    write_jsonl(
        root,
        "log_data/2018/11/2018-11-15-events.json",
        &[
            json!({
                "artist": "Marc Shaiman", "auth": "Logged In", "firstName": "Lily",
                "gender": "F", "itemInSession": 0, "lastName": "Koch", "length": 149.86404,
                "level": "paid", "location": "Chicago-Naperville-Elgin, IL-IN-WI",
                "method": "PUT", "page": "NextSong", "registration": 1_541_048_010_796.0_f64,
                "sessionId": 818, "song": "City Slickers", "status": 200,
                "ts": 1_542_241_826_796_i64, "userAgent": "Mozilla/5.0", "userId": "15"
            }),
            json!({
                "artist": null, "auth": "Logged In", "firstName": "Lily",
                "gender": "F", "itemInSession": 1, "lastName": "Koch", "length": null,
                "level": "paid", "location": "Chicago-Naperville-Elgin, IL-IN-WI",
                "method": "GET", "page": "Home", "registration": 1_541_048_010_796.0_f64,
                "sessionId": 818, "song": null, "status": 200,
                "ts": 1_542_241_900_000_i64, "userAgent": "Mozilla/5.0", "userId": "15"
            }),
            json!({
                "artist": "Nobody", "auth": "Logged In", "firstName": "Tegan",
                "gender": "F", "itemInSession": 2, "lastName": "Levine", "length": 200.0,
                "level": "free", "location": "Portland-South Portland, ME",
                "method": "PUT", "page": "NextSong", "registration": 1_540_794_356_796.0_f64,
                "sessionId": 611, "song": "Not In Catalog", "status": 200,
                "ts": 1_542_242_000_000_i64, "userAgent": "Mozilla/5.0", "userId": "80"
            }),
        ],
    );
}

struct Workspace {
    _dir: TempDir,
    input: PathBuf,
    output: PathBuf,
}

fn workspace() -> Workspace {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("raw");
    let output = dir.path().join("lake");
    fs::create_dir_all(&input).unwrap();
    seed_input(&input);
    Workspace {
        _dir: dir,
        input,
        output,
    }
}

fn session(ws: &Workspace) -> Session {
    let yaml = format!(
        "input_data: {}\noutput_data: {}\n",
        ws.input.display(),
        ws.output.display()
    );
    let config = load_pipeline_from_str(&yaml).unwrap();
    Session::open(&config).unwrap()
}

/// Every file below `root`, relative and sorted
fn files(root: &Path) -> Vec<String> {
    fn walk(dir: &Path, root: &Path, out: &mut Vec<String>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(&path, root, out);
            } else {
                out.push(path.strip_prefix(root).unwrap().display().to_string());
            }
        }
    }
    let mut out = Vec::new();
    walk(root, root, &mut out);
    out.sort();
    out
}

/// Directories holding Parquet data, plus every marker file
fn layout(root: &Path) -> Vec<String> {
    let mut out: Vec<String> = files(root)
        .into_iter()
        .map(|f| {
            if f.ends_with(".snappy.parquet") {
                let dir = Path::new(&f).parent().unwrap().display().to_string();
                format!("{dir}/*.snappy.parquet")
            } else {
                f
            }
        })
        .collect();
    out.sort();
    out.dedup();
    out
}

/// Rows of every Parquet file in `dir`, as text, in file order
fn read_rows(dir: &Path, select: &str) -> Vec<Vec<Option<String>>> {
    let engine = Engine::open(&EngineConfig::default()).unwrap();
    engine
        .query_text(&format!(
            "SELECT {select} FROM read_parquet('{}/*.parquet', hive_partitioning = false)",
            dir.display()
        ))
        .unwrap()
}

fn footer_rows(dir: &Path) -> i64 {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "parquet"))
        .map(|path| {
            let reader = SerializedFileReader::new(fs::File::open(path).unwrap()).unwrap();
            reader.metadata().file_metadata().num_rows()
        })
        .sum()
}

fn text(values: &[&str]) -> Vec<Option<String>> {
    values.iter().map(|v| Some(v.to_string())).collect()
}

#[tokio::test]
async fn test_full_run_layout() {
    let ws = workspace();
    let report = Pipeline::new(session(&ws))
        .run(StageSelection::All, &NoProgress)
        .await
        .unwrap();

    assert_eq!(report.tables.len(), 5);
    assert_eq!(
        layout(&ws.output),
        vec![
            "artists.parquet/*.snappy.parquet",
            "artists.parquet/_SUCCESS",
            "songplays.parquet/_SUCCESS",
            "songplays.parquet/year=2018/month=11/*.snappy.parquet",
            "songs.parquet/_SUCCESS",
            "songs.parquet/year=0/artist_id=ARD7TVE1187B99BFB1/*.snappy.parquet",
            "songs.parquet/year=2008/artist_id=AR8IEZO1187B99055E/*.snappy.parquet",
            "time_table.parquet/_SUCCESS",
            "time_table.parquet/year=2018/month=11/*.snappy.parquet",
            "users.parquet/*.snappy.parquet",
            "users.parquet/_SUCCESS",
        ]
    );

    let songplays_dir = ws.output.join("songplays.parquet/year=2018/month=11");
    assert_eq!(
        read_rows(&songplays_dir, "*"),
        vec![text(&[
            "2018-11-15 00:30:26.796",
            "15",
            "paid",
            "SOINLJW12A8C13314C",
            "AR8IEZO1187B99055E",
            "818",
            "",
            "Mozilla/5.0",
            "0",
        ])]
    );
    assert_eq!(footer_rows(&songplays_dir), 1);

    let users = read_rows(&ws.output.join("users.parquet"), "user_id, level");
    assert_eq!(users, vec![text(&["15", "paid"]), text(&["80", "free"])]);

    let time = read_rows(
        &ws.output.join("time_table.parquet/year=2018/month=11"),
        "hour, day, week, weekday",
    );
    assert_eq!(time, vec![text(&["0", "15", "46", "5"]), text(&["0", "15", "46", "5"])]);
}

#[tokio::test]
async fn test_rerun_is_byte_identical() {
    let ws = workspace();
    let snapshot = |root: &Path| -> Vec<(String, Vec<u8>)> {
        files(root)
            .into_iter()
            .map(|f| {
                let bytes = fs::read(root.join(&f)).unwrap();
                (f, bytes)
            })
            .collect()
    };

    Pipeline::new(session(&ws))
        .run(StageSelection::All, &NoProgress)
        .await
        .unwrap();
    let first = snapshot(&ws.output);

    Pipeline::new(session(&ws))
        .run(StageSelection::All, &NoProgress)
        .await
        .unwrap();
    let second = snapshot(&ws.output);

    assert_eq!(first.len(), second.len());
    assert!(first == second, "output changed between runs");
}

#[tokio::test]
async fn test_overwrite_removes_stale_partitions() {
    let ws = workspace();
    let stale = ws
        .output
        .join("songs.parquet/year=1999/artist_id=AROLD/part-00000.snappy.parquet");
    fs::create_dir_all(stale.parent().unwrap()).unwrap();
    fs::write(&stale, b"stale").unwrap();

    let report = Pipeline::new(session(&ws))
        .run(StageSelection::Catalog, &NoProgress)
        .await
        .unwrap();

    assert!(!stale.exists());
    assert!(!files(&ws.output).iter().any(|f| f.contains("AROLD")));
    assert_eq!(report.table("songs").unwrap().replaced, 1);
}

#[tokio::test]
async fn test_missing_log_data_fails() {
    let ws = workspace();
    fs::remove_dir_all(ws.input.join("log_data")).unwrap();

    let err = Pipeline::new(session(&ws))
        .run(StageSelection::All, &NoProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoInputData { .. }), "{err}");

    // Catalog tables were written before the failure
    assert!(ws.output.join("songs.parquet/_SUCCESS").exists());
    assert!(!ws.output.join("songplays.parquet").exists());
}

#[tokio::test]
async fn test_user_id_outside_bigint_fails() {
    let ws = workspace();
    write_jsonl(
        &ws.input,
        "log_data/2018/11/2018-11-16-events.json",
        &[json!({
            "page": "NextSong", "song": "City Slickers", "ts": 1_542_300_000_000_i64,
            "userId": 18_446_744_073_709_551_615_u64
        })],
    );

    let err = Pipeline::new(session(&ws))
        .run(StageSelection::Activity, &NoProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Engine { .. }), "{err}");
    assert!(!ws.output.join("users.parquet").exists());
}

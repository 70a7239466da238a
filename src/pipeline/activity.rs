//! Activity stage: users, time and songplays

use super::catalog::SONG_DATA;
use super::{write_table, ProgressReporter, Stage};
use crate::calendar::{start_time_sql, CalendarField};
use crate::engine::{alias, col, ident, literal, select_distinct};
use crate::error::Result;
use crate::output::TableReport;
use crate::schema::{log_data_schema, song_data_schema, TableSpec};
use crate::session::Session;
use async_trait::async_trait;
use tracing::{info, warn};

/// Engine table holding the raw activity log
pub const LOG_DATA: &str = "log_data";

/// Page value of a song-play event
pub const NEXT_SONG: &str = "NextSong";

/// Predicate selecting song-play events
pub fn song_play_filter(page: &str) -> String {
    format!("{page} = {}", literal(NEXT_SONG))
}

/// `userId` text as BIGINT: blank is NULL, anything else must parse
pub fn user_id_sql(user_id: &str) -> String {
    format!("CAST(NULLIF(trim({user_id}), '') AS BIGINT)")
}

/// Distinct user rows from song-play events
pub fn users_query() -> String {
    select_distinct(
        &[
            alias(&user_id_sql(&col("userId")), "user_id"),
            alias(&col("firstName"), "first_name"),
            alias(&col("lastName"), "last_name"),
            col("gender"),
            col("level"),
        ],
        &ident(LOG_DATA),
        Some(&song_play_filter(&col("page"))),
    )
}

/// Distinct start times of song plays with their calendar breakdown
pub fn time_query() -> String {
    let plays = format!(
        "(SELECT {}, _file, _row FROM {} WHERE {}) AS plays",
        alias(&start_time_sql(&col("ts")), "start_time"),
        ident(LOG_DATA),
        song_play_filter(&col("page"))
    );

    let start = col("start_time");
    let mut columns = vec![start.clone()];
    columns.extend(
        CalendarField::ALL
            .iter()
            .map(|field| alias(&field.sql(&start), field.name())),
    );
    select_distinct(&columns, &plays, None)
}

/// Song plays joined to the catalog on song title
///
/// Titles are not unique in the catalog, so one event can produce several
/// rows. Events without a matching title are dropped. `songplay_id` is the
/// event's file index in the high bits plus its position among that file's
/// joined rows, so ids are unique and increase in event order.
pub fn songplays_query() -> String {
    let e = |name: &str| format!("e.{}", col(name));
    let s = |name: &str| format!("s.{}", col(name));
    let start = start_time_sql(&e("ts"));

    let columns = [
        alias(&start, "start_time"),
        alias(&user_id_sql(&e("userId")), "user_id"),
        alias(&e("level"), "level"),
        alias(&s("song_id"), "song_id"),
        alias(&s("artist_id"), "artist_id"),
        alias(&e("sessionId"), "session_id"),
        alias(&s("artist_location"), "location"),
        alias(&e("userAgent"), "user_agent"),
        alias(&CalendarField::Month.sql(&start), "month"),
        alias(&CalendarField::Year.sql(&start), "year"),
        alias(
            "CAST((e._file << 33) + row_number() OVER \
             (PARTITION BY e._file ORDER BY e._row, s._file, s._row) - 1 AS BIGINT)",
            "songplay_id",
        ),
    ];

    format!(
        "SELECT {} FROM {} AS e JOIN {} AS s ON {} = {} WHERE {} ORDER BY {}",
        columns.join(", "),
        ident(LOG_DATA),
        ident(SONG_DATA),
        e("song"),
        s("title"),
        song_play_filter(&e("page")),
        col("songplay_id")
    )
}

/// Reads the activity log (and the catalog) and writes `users`, `time`
/// and `songplays`
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivityStage;

#[async_trait]
impl Stage for ActivityStage {
    fn name(&self) -> &'static str {
        "activity"
    }

    async fn run(
        &self,
        session: &Session,
        progress: &dyn ProgressReporter,
    ) -> Result<Vec<TableReport>> {
        let events =
            session.load_json(LOG_DATA, &session.sources().log_data, &log_data_schema())?;
        let plays = session.engine().count_query(&format!(
            "SELECT 1 FROM {} WHERE {}",
            ident(LOG_DATA),
            song_play_filter(&col("page"))
        ))?;
        info!(events, plays, "activity log loaded");
        if plays == 0 {
            warn!("no {NEXT_SONG} events in the activity log");
        }

        let users_report =
            write_table(session, progress, &TableSpec::users(), &users_query()).await?;
        let time_report =
            write_table(session, progress, &TableSpec::time(), &time_query()).await?;

        session.load_json(SONG_DATA, &session.sources().song_data, &song_data_schema())?;
        let songplays_report =
            write_table(session, progress, &TableSpec::songplays(), &songplays_query()).await?;
        info!(
            plays,
            songplays = songplays_report.rows,
            "song plays joined to catalog"
        );

        Ok(vec![users_report, time_report, songplays_report])
    }
}

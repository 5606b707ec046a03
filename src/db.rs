use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, Row};

use crate::listing::Announcement;
use crate::parser::record::OutputRow;

pub fn connect(path: &str) -> Result<Connection> {
    if let Some(dir) = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open {}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS announcements (
            id           INTEGER PRIMARY KEY,
            info_id      TEXT UNIQUE NOT NULL,
            category     TEXT NOT NULL,
            project_type TEXT NOT NULL,
            region       TEXT NOT NULL,
            title        TEXT NOT NULL,
            info_date    TEXT NOT NULL,
            url          TEXT NOT NULL,
            visited      BOOLEAN NOT NULL DEFAULT 0,
            visited_at   TEXT,
            created_at   TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_announcements_visited ON announcements(visited);

        CREATE TABLE IF NOT EXISTS page_data (
            id              INTEGER PRIMARY KEY,
            announcement_id INTEGER NOT NULL REFERENCES announcements(id),
            html            TEXT,
            error           TEXT,
            latency_ms      INTEGER,
            scraped_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_page_data_announcement ON page_data(announcement_id);

        CREATE TABLE IF NOT EXISTS bid_results (
            id              INTEGER PRIMARY KEY,
            announcement_id INTEGER NOT NULL REFERENCES announcements(id),
            row_idx         INTEGER NOT NULL,
            status          TEXT NOT NULL CHECK(status IN ('Y','N')),
            project_type    TEXT NOT NULL,
            region          TEXT NOT NULL,
            name            TEXT NOT NULL,
            number          TEXT NOT NULL,
            publish_date    TEXT NOT NULL,
            winner          TEXT NOT NULL,
            price           TEXT NOT NULL,
            duration        TEXT NOT NULL,
            manager         TEXT NOT NULL,
            oversight       TEXT NOT NULL,
            info_date       TEXT NOT NULL,
            url             TEXT NOT NULL,
            processed_at    TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(announcement_id, row_idx)
        );
        ",
    )?;
    Ok(())
}

// ── Listing ──

/// Insert in listing order; already-known announcements are ignored.
pub fn insert_announcements(
    conn: &Connection,
    category: &str,
    announcements: &[Announcement],
) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO announcements
             (info_id, category, project_type, region, title, info_date, url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for a in announcements {
            count += stmt.execute(rusqlite::params![
                a.info_id, category, a.project_type, a.region, a.title, a.info_date, a.url,
            ])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

const ANNOUNCEMENT_COLS: &str = "a.id, a.info_id, a.project_type, a.region, a.title, a.info_date, a.url";

fn read_announcement(row: &Row) -> rusqlite::Result<(i64, Announcement)> {
    Ok((
        row.get(0)?,
        Announcement {
            info_id: row.get(1)?,
            project_type: row.get(2)?,
            region: row.get(3)?,
            title: row.get(4)?,
            info_date: row.get(5)?,
            url: row.get(6)?,
        },
    ))
}

fn limit_clause(limit: Option<usize>) -> String {
    match limit {
        Some(n) => format!(" LIMIT {}", n),
        None => String::new(),
    }
}

pub struct PendingPage {
    pub id: i64,
    pub announcement: Announcement,
}

pub fn fetch_unvisited(conn: &Connection, limit: Option<usize>) -> Result<Vec<PendingPage>> {
    let sql = format!(
        "SELECT {} FROM announcements a WHERE a.visited = 0 ORDER BY a.id{}",
        ANNOUNCEMENT_COLS,
        limit_clause(limit)
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            let (id, announcement) = read_announcement(row)?;
            Ok(PendingPage { id, announcement })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Scraping ──

pub struct PageRow {
    pub announcement_id: i64,
    pub html: Option<String>,
    pub error: Option<String>,
    pub latency_ms: Option<i64>,
}

/// Store a fetch outcome and mark its announcement visited.
pub fn save_page(conn: &Connection, row: &PageRow) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO page_data (announcement_id, html, error, latency_ms) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![row.announcement_id, row.html, row.error, row.latency_ms],
    )?;
    tx.execute(
        "UPDATE announcements SET visited = 1, visited_at = datetime('now') WHERE id = ?1",
        rusqlite::params![row.announcement_id],
    )?;
    tx.commit()?;
    Ok(())
}

// ── Processing ──

pub struct FetchedPage {
    pub announcement_id: i64,
    pub announcement: Announcement,
    pub html: String,
}

/// Pages with markup and no results yet, in listing order.
pub fn fetch_unprocessed(conn: &Connection, limit: Option<usize>) -> Result<Vec<FetchedPage>> {
    let sql = format!(
        "SELECT {}, pd.html
         FROM page_data pd
         JOIN announcements a ON a.id = pd.announcement_id
         WHERE pd.html IS NOT NULL
           AND NOT EXISTS (SELECT 1 FROM bid_results b WHERE b.announcement_id = a.id)
         ORDER BY a.id, pd.id{}",
        ANNOUNCEMENT_COLS,
        limit_clause(limit)
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            let (announcement_id, announcement) = read_announcement(row)?;
            Ok(FetchedPage { announcement_id, announcement, html: row.get(7)? })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn save_results(conn: &Connection, results: &[(i64, Vec<OutputRow>)]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO bid_results
             (announcement_id, row_idx, status, project_type, region, name, number, publish_date,
              winner, price, duration, manager, oversight, info_date, url)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15)",
        )?;
        for (announcement_id, rows) in results {
            for (idx, r) in rows.iter().enumerate() {
                count += stmt.execute(rusqlite::params![
                    announcement_id, idx as i64, r.status, r.project_type, r.region, r.name,
                    r.number, r.publish_date, r.winner, r.price, r.duration, r.manager,
                    r.oversight, r.info_date, r.url,
                ])?;
            }
        }
    }
    tx.commit()?;
    Ok(count)
}

// ── Export ──

pub fn fetch_results(conn: &Connection) -> Result<Vec<OutputRow>> {
    let mut stmt = conn.prepare(
        "SELECT status, project_type, region, name, number, publish_date, winner, price,
                duration, manager, oversight, info_date, url
         FROM bid_results
         ORDER BY announcement_id, row_idx",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(OutputRow {
                status: row.get(0)?,
                project_type: row.get(1)?,
                region: row.get(2)?,
                name: row.get(3)?,
                number: row.get(4)?,
                publish_date: row.get(5)?,
                winner: row.get(6)?,
                price: row.get(7)?,
                duration: row.get(8)?,
                manager: row.get(9)?,
                oversight: row.get(10)?,
                info_date: row.get(11)?,
                url: row.get(12)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub total: usize,
    pub visited: usize,
    pub unvisited: usize,
    pub scraped: usize,
    pub errors: usize,
    pub processed: usize,
    pub result_rows: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let count = |sql: &str| -> Result<usize> { Ok(conn.query_row(sql, [], |r| r.get(0))?) };
    let total = count("SELECT COUNT(*) FROM announcements")?;
    let visited = count("SELECT COUNT(*) FROM announcements WHERE visited = 1")?;
    Ok(Stats {
        total,
        visited,
        unvisited: total - visited,
        scraped: count("SELECT COUNT(*) FROM page_data WHERE html IS NOT NULL")?,
        errors: count("SELECT COUNT(*) FROM page_data WHERE error IS NOT NULL")?,
        processed: count("SELECT COUNT(DISTINCT announcement_id) FROM bid_results")?,
        result_rows: count("SELECT COUNT(*) FROM bid_results")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn announcement(id: &str) -> Announcement {
        Announcement {
            info_id: id.into(),
            project_type: "水利工程".into(),
            region: "梧州市".into(),
            title: format!("{}中标公示", id),
            info_date: "2024-02-01".into(),
            url: format!("http://host/{}.html", id),
        }
    }

    fn row(winner: &str) -> OutputRow {
        OutputRow { status: "Y".into(), winner: winner.into(), ..Default::default() }
    }

    #[test]
    fn insert_ignores_duplicates() {
        let conn = memory();
        let code = "001001002005";
        assert_eq!(insert_announcements(&conn, code, &[announcement("a"), announcement("b")]).unwrap(), 2);
        assert_eq!(insert_announcements(&conn, code, &[announcement("b"), announcement("c")]).unwrap(), 1);
        let pending = fetch_unvisited(&conn, None).unwrap();
        let ids: Vec<&str> = pending.iter().map(|p| p.announcement.info_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(fetch_unvisited(&conn, Some(1)).unwrap().len(), 1);
    }

    #[test]
    fn page_lifecycle() {
        let conn = memory();
        insert_announcements(&conn, "x", &[announcement("a"), announcement("b")]).unwrap();
        let pending = fetch_unvisited(&conn, None).unwrap();

        save_page(&conn, &PageRow {
            announcement_id: pending[0].id,
            html: Some("<html></html>".into()),
            error: None,
            latency_ms: Some(12),
        })
        .unwrap();
        save_page(&conn, &PageRow {
            announcement_id: pending[1].id,
            html: None,
            error: Some("HTTP 500".into()),
            latency_ms: None,
        })
        .unwrap();
        assert!(fetch_unvisited(&conn, None).unwrap().is_empty());

        let fetched = fetch_unprocessed(&conn, None).unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].announcement, announcement("a"));
        assert_eq!(fetched[0].html, "<html></html>");

        let saved = save_results(&conn, &[(fetched[0].announcement_id, vec![row("甲"), row("乙")])]).unwrap();
        assert_eq!(saved, 2);
        assert!(fetch_unprocessed(&conn, None).unwrap().is_empty());

        let stats = get_stats(&conn).unwrap();
        assert_eq!((stats.total, stats.visited, stats.unvisited), (2, 2, 0));
        assert_eq!((stats.scraped, stats.errors), (1, 1));
        assert_eq!((stats.processed, stats.result_rows), (1, 2));
    }

    #[test]
    fn results_keep_listing_then_row_order() {
        let conn = memory();
        insert_announcements(&conn, "x", &[announcement("a"), announcement("b")]).unwrap();
        let ids: Vec<i64> = fetch_unvisited(&conn, None).unwrap().iter().map(|p| p.id).collect();
        save_results(&conn, &[(ids[1], vec![row("丙")])]).unwrap();
        save_results(&conn, &[(ids[0], vec![row("甲"), row("乙")])]).unwrap();
        let winners: Vec<String> = fetch_results(&conn).unwrap().into_iter().map(|r| r.winner).collect();
        assert_eq!(winners, vec!["甲", "乙", "丙"]);
    }
}

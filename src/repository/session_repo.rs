// ==========================================
// 牙科治疗工作流排程系统 - 编辑会话仓储
// ==========================================
// 职责: 整会话快照的保存/恢复/列表/删除, 不含业务逻辑
// 存储形态: 快照整体序列化为 JSON 存单列 (对仓储而言是不透明数据)
// 并发约定: 同一草稿同时只有一个编辑者, 最后写入者胜
// ==========================================

use crate::engine::session::SessionSnapshot;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// 存储实体
// ==========================================

/// 已保存的编辑会话 (元数据 + 快照)
#[derive(Debug, Clone)]
pub struct StoredSession {
    pub session_id: String,
    pub session_name: String,
    pub snapshot: SessionSnapshot,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// 会话列表条目 (不携带快照本体)
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub session_name: String,
    pub catalog_version: String,
    pub condition_count: usize, // 条件记录数
    pub node_count: usize,      // 卡片数
    pub slot_count: usize,      // 槽位数
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// ==========================================
// EditSessionRepository - 编辑会话仓储
// ==========================================
pub struct EditSessionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EditSessionRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        let repo = Self { conn };
        // 建表失败不阻塞启动, 后续使用时错误会再次浮现
        if let Err(e) = repo.ensure_table() {
            tracing::warn!("edit_sessions ensure failed: {}", e);
        }
        repo
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS edit_sessions (
              session_id TEXT PRIMARY KEY,
              session_name TEXT NOT NULL,
              snapshot_json TEXT NOT NULL,
              catalog_version TEXT NOT NULL,
              condition_count INTEGER NOT NULL DEFAULT 0,
              node_count INTEGER NOT NULL DEFAULT 0,
              slot_count INTEGER NOT NULL DEFAULT 0,
              created_at TEXT NOT NULL,
              updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_edit_sessions_updated_at ON edit_sessions(updated_at DESC);
            "#,
        )?;
        Ok(())
    }

    /// 保存会话 (同 id 覆盖, 保留首次创建时间)
    pub fn save(&self, session: &StoredSession) -> RepositoryResult<()> {
        let snapshot_json = serde_json::to_string(&session.snapshot)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO edit_sessions (
              session_id, session_name, snapshot_json, catalog_version,
              condition_count, node_count, slot_count,
              created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(session_id) DO UPDATE SET
              session_name = excluded.session_name,
              snapshot_json = excluded.snapshot_json,
              catalog_version = excluded.catalog_version,
              condition_count = excluded.condition_count,
              node_count = excluded.node_count,
              slot_count = excluded.slot_count,
              updated_at = excluded.updated_at
            "#,
            params![
                session.session_id,
                session.session_name,
                snapshot_json,
                session.snapshot.catalog_version,
                session.snapshot.tooth_conditions.condition_count() as i64,
                session.snapshot.workflow_nodes.len() as i64,
                session.snapshot.schedule_slots.len() as i64,
                session.created_at,
                session.updated_at,
            ],
        )?;
        Ok(())
    }

    /// 按 id 读取会话 (不存在返回 None)
    pub fn find_by_id(&self, session_id: &str) -> RepositoryResult<Option<StoredSession>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT session_id, session_name, snapshot_json, created_at, updated_at
            FROM edit_sessions
            WHERE session_id = ?1
            "#,
        )?;

        let mut rows = stmt.query(params![session_id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let snapshot_json: String = row.get(2)?;
        let snapshot: SessionSnapshot =
            serde_json::from_str(&snapshot_json).map_err(|e| RepositoryError::SnapshotDecodeError {
                session_id: session_id.to_string(),
                message: e.to_string(),
            })?;

        Ok(Some(StoredSession {
            session_id: row.get(0)?,
            session_name: row.get(1)?,
            snapshot,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        }))
    }

    /// 会话列表 (最近更新在前)
    pub fn list(&self) -> RepositoryResult<Vec<SessionSummary>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT session_id, session_name, catalog_version,
                   condition_count, node_count, slot_count,
                   created_at, updated_at
            FROM edit_sessions
            ORDER BY updated_at DESC, session_id
            "#,
        )?;

        let summaries = stmt
            .query_map([], Self::map_summary_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(summaries)
    }

    /// 重命名会话
    pub fn rename(&self, session_id: &str, new_name: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE edit_sessions SET session_name = ?2 WHERE session_id = ?1",
            params![session_id, new_name],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "EditSession".to_string(),
                id: session_id.to_string(),
            });
        }
        Ok(())
    }

    /// 删除会话
    pub fn delete(&self, session_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM edit_sessions WHERE session_id = ?1",
            params![session_id],
        )?;
        Ok(affected > 0)
    }

    fn map_summary_row(row: &Row<'_>) -> rusqlite::Result<SessionSummary> {
        Ok(SessionSummary {
            session_id: row.get(0)?,
            session_name: row.get(1)?,
            catalog_version: row.get(2)?,
            condition_count: row.get::<_, i64>(3)? as usize,
            node_count: row.get::<_, i64>(4)? as usize,
            slot_count: row.get::<_, i64>(5)? as usize,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

// ==========================================
// 牙科治疗工作流排程系统 - 工作流业务接口
// ==========================================
// 职责: 将 UI 输入事件编排为引擎调用, 组装响应
// 约定: UI 以字符串传入标识, 本层负责解析与校验
// 红线: 排程顺序冲突以结构化结果返回 (success=false), 不抛错误
// ==========================================

use crate::api::dto::{
    MoveNodeResult, RestoreSessionResponse, SaveSessionResponse, WorkflowOverview,
};
use crate::api::error::{ApiError, ApiResult};
use crate::catalog::TreatmentCatalog;
use crate::domain::condition::ConditionCode;
use crate::domain::types::{GroupingMode, ToothId};
use crate::domain::workflow::{NodeId, ScheduleSlot, UnitKey, WorkflowNode};
use crate::engine::allocator::UnscheduledGroup;
use crate::engine::session::WorkflowSession;
use crate::i18n;
use crate::repository::session_repo::{EditSessionRepository, SessionSummary, StoredSession};
use std::sync::{Mutex, MutexGuard};

// ==========================================
// WorkflowApi - 工作流业务接口
// ==========================================
pub struct WorkflowApi {
    catalog: TreatmentCatalog,
    session: Mutex<WorkflowSession>,
    session_repo: EditSessionRepository,
}

impl WorkflowApi {
    /// 以设置协作方提供的目录快照构建接口, 并开启一个空白会话
    pub fn new(catalog: TreatmentCatalog, session_repo: EditSessionRepository) -> Self {
        let session = WorkflowSession::new(catalog.clone());
        Self {
            catalog,
            session: Mutex::new(session),
            session_repo,
        }
    }

    fn session(&self) -> ApiResult<MutexGuard<'_, WorkflowSession>> {
        self.session
            .lock()
            .map_err(|e| ApiError::SessionLockError(e.to_string()))
    }

    fn parse_tooth(tooth: &str) -> ApiResult<ToothId> {
        tooth
            .parse::<ToothId>()
            .map_err(|e| ApiError::InvalidInput(e.to_string()))
    }

    fn parse_code(code: &str) -> ApiResult<ConditionCode> {
        code.parse::<ConditionCode>()
            .map_err(|e| ApiError::InvalidInput(e.to_string()))
    }

    fn parse_node_id(node_id: &str) -> ApiResult<NodeId> {
        node_id
            .parse::<NodeId>()
            .map_err(|_| ApiError::InvalidInput(format!("非法的节点标识: {}", node_id)))
    }

    fn overview_of(session: &WorkflowSession) -> WorkflowOverview {
        WorkflowOverview {
            node_count: session.node_count(),
            scheduled_count: session.scheduled_count(),
            unscheduled_count: session.node_count() - session.scheduled_count(),
            slot_count: session.slot_count(),
            tooth_count: session.tooth_conditions().tooth_count(),
            condition_count: session.tooth_conditions().condition_count(),
            grouping_mode: session.grouping_mode().to_string(),
            catalog_version: session.catalog().version(),
        }
    }

    // ==========================================
    // 临床录入接口
    // ==========================================

    /// 切换某牙位上的某条件
    ///
    /// # 返回
    /// true = 本次为添加, false = 本次为移除
    pub fn toggle_condition(&self, tooth: &str, condition_code: &str) -> ApiResult<bool> {
        let tooth = Self::parse_tooth(tooth)?;
        let code = Self::parse_code(condition_code)?;
        let mut session = self.session()?;
        let added = session.toggle_condition(tooth, code)?;
        Ok(added)
    }

    /// 录入不挂牙位的临床所见
    ///
    /// # 返回
    /// 为该记录分配的标识
    pub fn record_finding(&self, condition_code: &str) -> ApiResult<String> {
        let code = Self::parse_code(condition_code)?;
        let mut session = self.session()?;
        let tooth = session.record_unattached_condition(code)?;
        Ok(tooth.to_string())
    }

    /// 设置治疗分组模式
    pub fn set_grouping_mode(&self, mode: &str) -> ApiResult<()> {
        let mode = GroupingMode::parse(mode);
        self.session()?.set_grouping_mode(mode);
        Ok(())
    }

    /// 清空临床录入
    pub fn clear_conditions(&self) -> ApiResult<()> {
        self.session()?.clear_conditions();
        Ok(())
    }

    /// 整体复位会话
    pub fn reset_session(&self) -> ApiResult<()> {
        self.session()?.reset();
        Ok(())
    }

    // ==========================================
    // 生成与方案选择接口
    // ==========================================

    /// 触发工作流生成 (整体重建, 排程清空)
    pub fn generate_workflow(&self) -> ApiResult<WorkflowOverview> {
        let mut session = self.session()?;
        let count = session.generate();
        tracing::info!(
            node_count = count,
            "{}",
            i18n::t_with_args("workflow.generated", &[("count", &count.to_string())])
        );
        Ok(Self::overview_of(&session))
    }

    /// 更换某治疗单元的方案 (仅失效该单元的疗程排程)
    pub fn change_rule_selection(&self, unit_key: &str, rule_index: usize) -> ApiResult<WorkflowOverview> {
        if unit_key.trim().is_empty() {
            return Err(ApiError::InvalidInput("治疗单元键不能为空".to_string()));
        }
        let unit_key = UnitKey::from(unit_key);
        let mut session = self.session()?;
        session.select_rule(&unit_key, rule_index)?;
        tracing::info!(unit_key = %unit_key, rule_index, "治疗方案已更换, 工作流重新生成");
        Ok(Self::overview_of(&session))
    }

    // ==========================================
    // 排程接口
    // ==========================================

    /// 将治疗步骤移入目标就诊槽位
    ///
    /// 顺序冲突不视为错误: 以 success=false 的结构化结果返回
    pub fn move_node(&self, node_id: &str, to_slot: usize) -> ApiResult<MoveNodeResult> {
        let id = Self::parse_node_id(node_id)?;
        let mut session = self.session()?;
        let from_slot = session.slot_of(&id);

        match session.place(&id, to_slot) {
            Ok(()) => Ok(MoveNodeResult {
                node_id: id,
                success: true,
                from_slot,
                to_slot: Some(to_slot),
                error: None,
                conflict_type: None,
            }),
            Err(conflict) => {
                tracing::debug!(node_id = %id, to_slot, conflict = %conflict, "排程移动被拒绝");
                Ok(MoveNodeResult {
                    node_id: id,
                    success: false,
                    from_slot,
                    to_slot: Some(to_slot),
                    error: Some(conflict.to_string()),
                    conflict_type: Some(conflict.kind().to_string()),
                })
            }
        }
    }

    /// 将治疗步骤移回待排 (总是成功)
    pub fn unplace_node(&self, node_id: &str) -> ApiResult<MoveNodeResult> {
        let id = Self::parse_node_id(node_id)?;
        let mut session = self.session()?;
        let from_slot = session.slot_of(&id);
        session.unplace(&id);
        Ok(MoveNodeResult {
            node_id: id,
            success: true,
            from_slot,
            to_slot: None,
            error: None,
            conflict_type: None,
        })
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 当前工作流的全部卡片 (生成顺序)
    pub fn workflow_nodes(&self) -> ApiResult<Vec<WorkflowNode>> {
        let session = self.session()?;
        Ok(session.workflow_nodes().into_iter().cloned().collect())
    }

    /// 当前全部就诊槽位视图
    pub fn schedule_slots(&self) -> ApiResult<Vec<ScheduleSlot>> {
        Ok(self.session()?.schedule_slots())
    }

    /// 待排分组视图
    pub fn unscheduled_groups(&self) -> ApiResult<Vec<UnscheduledGroup>> {
        Ok(self.session()?.unscheduled_groups())
    }

    /// 会话汇总
    pub fn overview(&self) -> ApiResult<WorkflowOverview> {
        let session = self.session()?;
        Ok(Self::overview_of(&session))
    }

    // ==========================================
    // 会话持久化接口 (持久化协作方)
    // ==========================================

    /// 保存当前会话快照
    ///
    /// # 参数
    /// - session_id: 已有会话 id (覆盖保存); None 表示另存为新会话
    /// - session_name: 会话名称
    pub fn save_session(&self, session_id: Option<&str>, session_name: &str) -> ApiResult<SaveSessionResponse> {
        let session_name = session_name.trim();
        if session_name.is_empty() {
            return Err(ApiError::InvalidInput("会话名称不能为空".to_string()));
        }

        let snapshot = self.session()?.snapshot();
        let session_id = session_id
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let now = chrono::Local::now().naive_local();

        self.session_repo.save(&StoredSession {
            session_id: session_id.clone(),
            session_name: session_name.to_string(),
            snapshot,
            created_at: now,
            updated_at: now,
        })?;

        tracing::info!(session_id = %session_id, session_name, "编辑会话已保存");
        Ok(SaveSessionResponse {
            session_id,
            session_name: session_name.to_string(),
            message: i18n::t("session.saved"),
        })
    }

    /// 恢复已保存的会话 (替换当前会话)
    pub fn restore_session(&self, session_id: &str) -> ApiResult<RestoreSessionResponse> {
        let stored = self
            .session_repo
            .find_by_id(session_id)?
            .ok_or_else(|| ApiError::NotFound(format!("EditSession(id={})不存在", session_id)))?;

        let restored = WorkflowSession::restore(stored.snapshot, self.catalog.clone())?;
        let mut session = self.session()?;
        *session = restored;

        tracing::info!(session_id = %session_id, "编辑会话已恢复");
        Ok(RestoreSessionResponse {
            session_id: session_id.to_string(),
            overview: Self::overview_of(&session),
            message: i18n::t("session.restored"),
        })
    }

    /// 已保存会话列表 (最近更新在前)
    pub fn list_sessions(&self) -> ApiResult<Vec<SessionSummary>> {
        Ok(self.session_repo.list()?)
    }

    /// 重命名已保存会话
    pub fn rename_session(&self, session_id: &str, new_name: &str) -> ApiResult<()> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(ApiError::InvalidInput("会话名称不能为空".to_string()));
        }
        self.session_repo.rename(session_id, new_name)?;
        Ok(())
    }

    /// 删除已保存会话
    pub fn delete_session(&self, session_id: &str) -> ApiResult<bool> {
        let deleted = self.session_repo.delete(session_id)?;
        if deleted {
            tracing::info!(session_id = %session_id, "{}", i18n::t("session.deleted"));
        }
        Ok(deleted)
    }
}

//! # Custody Workflow
//!
//! The nine transitions of a custody chain. Each handler evaluates every
//! precondition before touching the record, so a rejected transition
//! leaves no partial write behind.
//!
//! ## Access Rules
//!
//! | Operation | Role | Custodian / status |
//! |---|---|---|
//! | `initNewChain` | `member` | record must not exist |
//! | `startTransfer` | not `administrator` | custodian, `IN_CUSTODY` |
//! | `completeTransfer` | not `member`/`administrator` (strict) | custodian, `TRANSFER_PENDING` |
//! | `commentChain` | not `member` (strict); `administrator` or custodian | any status |
//! | `cancelTransfer` | `administrator` or custodian | `TRANSFER_PENDING` |
//! | `terminateChain` | not `member`/`operator`; `administrator` or custodian | `IN_CUSTODY` |
//! | `updateDocument` | `administrator` | `IN_CUSTODY` |
//! | `getAssetDetails` | `administrator`, `operator`, `delivery_operator` | any |
//! | `getChainOfEvents` | `administrator` | any |
//!
//! Every successful mutation stamps a new [`Event`](dcot_core::Event) on
//! the record, writes it and emits a ledger event named after the
//! operation, carrying the serialized record.

use dcot_core::{
    AssetId, CallerIdentity, CustodyDraft, CustodyError, CustodyRecord, CustodyStatus, Operation,
    Role, StateError,
};
use dcot_ledger::ChaincodeStub;

use crate::event::EventRecorder;
use crate::policy::RoleExclusionPolicy;
use crate::store::{CustodyStore, RecordKey};

/// Executes custody transitions against a transaction's ledger view.
#[derive(Debug, Clone, Default)]
pub struct CustodyWorkflow {
    policy: RoleExclusionPolicy,
    recorder: EventRecorder,
}

impl CustodyWorkflow {
    pub fn new(policy: RoleExclusionPolicy, recorder: EventRecorder) -> Self {
        Self { policy, recorder }
    }

    pub fn policy(&self) -> RoleExclusionPolicy {
        self.policy
    }

    /// Run `operation` on behalf of `caller`.
    ///
    /// Returns the response payload, if the operation produces one.
    ///
    /// # Errors
    ///
    /// Argument count mismatches are [`CustodyError::Validation`]; every
    /// other failure is reported by the handler that detects it.
    pub fn execute(
        &self,
        operation: Operation,
        stub: &mut dyn ChaincodeStub,
        caller: &CallerIdentity,
        args: &[String],
    ) -> Result<Option<String>, CustodyError> {
        if args.len() != operation.arity() {
            return Err(CustodyError::Validation(format!(
                "{operation} expects exactly {} argument(s), got {}",
                operation.arity(),
                args.len()
            )));
        }

        let mut store = CustodyStore::new(stub);
        match operation {
            Operation::InitNewChain => self.init_new_chain(&mut store, caller, &args[0]).map(Some),
            Operation::StartTransfer => self
                .start_transfer(&mut store, caller, &args[0], &args[1])
                .map(|_| None),
            Operation::CompleteTransfer => self
                .complete_transfer(&mut store, caller, &args[0])
                .map(|_| None),
            Operation::CommentChain => self
                .comment_chain(&mut store, caller, &args[0], &args[1])
                .map(|_| None),
            Operation::CancelTransfer => self
                .cancel_transfer(&mut store, caller, &args[0])
                .map(|_| None),
            Operation::TerminateChain => self
                .terminate_chain(&mut store, caller, &args[0])
                .map(|_| None),
            Operation::UpdateDocument => self
                .update_document(&mut store, caller, &args[0], &args[1])
                .map(Some),
            Operation::GetAssetDetails => self
                .get_asset_details(&mut store, caller, &args[0])
                .map(Some),
            Operation::GetChainOfEvents => self
                .get_chain_of_events(&store, caller, &args[0])
                .map(Some),
        }
    }

    fn init_new_chain(
        &self,
        store: &mut CustodyStore<'_>,
        caller: &CallerIdentity,
        raw_draft: &str,
    ) -> Result<String, CustodyError> {
        let op = Operation::InitNewChain;
        let draft = CustodyDraft::parse(raw_draft)?;
        if draft.document_id.is_empty() {
            return Err(CustodyError::Validation(
                "document id must not be empty".to_string(),
            ));
        }
        if !caller.has_role(Role::Member) {
            return Err(deny(op, caller, "only a member may create a custody chain"));
        }
        if caller.caller_id().is_empty() {
            return Err(CustodyError::Validation(
                "caller unique id is empty".to_string(),
            ));
        }

        let id = AssetId::generate();
        let key = store.key_for(&id)?;
        if store.exists(&key)? {
            return Err(StateError::AlreadyExists {
                asset_id: id.to_string(),
            }
            .into());
        }

        let event = self
            .recorder
            .create_event(caller.caller_id(), caller.role_name(), op.as_str())?;
        let record = CustodyRecord::from_draft(draft, id, caller.caller_id().to_string(), event);
        let json = store.write(&key, &record)?;
        store.notify(op, &json)?;
        tracing::info!(
            asset_id = %record.id,
            caller = caller.caller_id(),
            operation = %op,
            status = %record.status,
            "custody chain created"
        );
        tracing::debug!(record = %json, "record written");
        Ok(json)
    }

    fn start_transfer(
        &self,
        store: &mut CustodyStore<'_>,
        caller: &CallerIdentity,
        asset_id: &str,
        new_custodian: &str,
    ) -> Result<String, CustodyError> {
        let op = Operation::StartTransfer;
        if caller.has_role(Role::Administrator) {
            return Err(deny(op, caller, "an administrator may not start a transfer"));
        }
        let key = store.key_for(&AssetId::new(asset_id)?)?;
        let mut record = store.read(&key)?;
        require_custodian(op, caller, &record)?;
        require_status(op, &record, CustodyStatus::InCustody)?;
        if new_custodian.is_empty() {
            return Err(CustodyError::Validation(
                "new custodian id must not be empty".to_string(),
            ));
        }

        do_transition(op, &mut record, CustodyStatus::TransferPending)?;
        record.delivery_man = new_custodian.to_string();
        self.persist(store, &key, record, caller, op)
    }

    fn complete_transfer(
        &self,
        store: &mut CustodyStore<'_>,
        caller: &CallerIdentity,
        asset_id: &str,
    ) -> Result<String, CustodyError> {
        let op = Operation::CompleteTransfer;
        if caller.has_any_role(&[Role::Member, Role::Administrator]) {
            self.role_exclusion(
                op,
                caller,
                "a member or administrator may not complete a transfer",
            )?;
        }
        let key = store.key_for(&AssetId::new(asset_id)?)?;
        let mut record = store.read(&key)?;
        require_custodian(op, caller, &record)?;
        require_status(op, &record, CustodyStatus::TransferPending)?;

        do_transition(op, &mut record, CustodyStatus::InCustody)?;
        self.persist(store, &key, record, caller, op)
    }

    fn comment_chain(
        &self,
        store: &mut CustodyStore<'_>,
        caller: &CallerIdentity,
        asset_id: &str,
        text: &str,
    ) -> Result<String, CustodyError> {
        let op = Operation::CommentChain;
        let key = store.key_for(&AssetId::new(asset_id)?)?;
        let mut record = store.read(&key)?;
        if caller.has_role(Role::Member) {
            self.role_exclusion(op, caller, "a member may not comment a custody chain")?;
        }
        if !caller.has_role(Role::Administrator) && !caller.is_custodian(&record.delivery_man) {
            return Err(deny(
                op,
                caller,
                "only an administrator or the current custodian may comment",
            ));
        }

        record.text = text.to_string();
        self.persist(store, &key, record, caller, op)
    }

    fn cancel_transfer(
        &self,
        store: &mut CustodyStore<'_>,
        caller: &CallerIdentity,
        asset_id: &str,
    ) -> Result<String, CustodyError> {
        let op = Operation::CancelTransfer;
        let key = store.key_for(&AssetId::new(asset_id)?)?;
        let mut record = store.read(&key)?;
        require_status(op, &record, CustodyStatus::TransferPending)?;
        if !caller.is_custodian(&record.delivery_man) && !caller.has_role(Role::Administrator) {
            return Err(deny(
                op,
                caller,
                "only the current custodian or an administrator may cancel a transfer",
            ));
        }

        // deliveryMan stays at the pending recipient.
        do_transition(op, &mut record, CustodyStatus::InCustody)?;
        self.persist(store, &key, record, caller, op)
    }

    fn terminate_chain(
        &self,
        store: &mut CustodyStore<'_>,
        caller: &CallerIdentity,
        asset_id: &str,
    ) -> Result<String, CustodyError> {
        let op = Operation::TerminateChain;
        let key = store.key_for(&AssetId::new(asset_id)?)?;
        let mut record = store.read(&key)?;
        require_status(op, &record, CustodyStatus::InCustody)?;
        if caller.has_any_role(&[Role::Member, Role::Operator]) {
            return Err(deny(op, caller, "a member or operator may not terminate a chain"));
        }
        if !caller.has_role(Role::Administrator) && !caller.is_custodian(&record.delivery_man) {
            return Err(deny(
                op,
                caller,
                "only an administrator or the current custodian may terminate a chain",
            ));
        }

        do_transition(op, &mut record, CustodyStatus::Released)?;
        self.persist(store, &key, record, caller, op)
    }

    fn update_document(
        &self,
        store: &mut CustodyStore<'_>,
        caller: &CallerIdentity,
        asset_id: &str,
        document_id: &str,
    ) -> Result<String, CustodyError> {
        let op = Operation::UpdateDocument;
        let key = store.key_for(&AssetId::new(asset_id)?)?;
        let mut record = store.read(&key)?;
        if !caller.has_role(Role::Administrator) {
            return Err(deny(op, caller, "only an administrator may update the document"));
        }
        require_status(op, &record, CustodyStatus::InCustody)?;
        if document_id.is_empty() {
            return Err(CustodyError::Validation(
                "document id must not be empty".to_string(),
            ));
        }

        record.document_id = document_id.to_string();
        self.persist(store, &key, record, caller, op)
    }

    fn get_asset_details(
        &self,
        store: &mut CustodyStore<'_>,
        caller: &CallerIdentity,
        asset_id: &str,
    ) -> Result<String, CustodyError> {
        let op = Operation::GetAssetDetails;
        let key = store.key_for(&AssetId::new(asset_id)?)?;
        let record = store.read(&key)?;
        if !caller.has_any_role(&[Role::Administrator, Role::Operator, Role::DeliveryOperator]) {
            return Err(deny(op, caller, "role may not read asset details"));
        }
        record.to_json_string()
    }

    fn get_chain_of_events(
        &self,
        store: &CustodyStore<'_>,
        caller: &CallerIdentity,
        asset_id: &str,
    ) -> Result<String, CustodyError> {
        let op = Operation::GetChainOfEvents;
        if !caller.has_role(Role::Administrator) {
            return Err(deny(op, caller, "only an administrator may read the chain of events"));
        }
        let key = store.key_for(&AssetId::new(asset_id)?)?;
        let versions = store.history(&key)?.collect::<Result<Vec<_>, _>>()?;
        if versions.is_empty() {
            return Err(StateError::NotFound {
                asset_id: asset_id.to_string(),
            }
            .into());
        }
        tracing::debug!(asset_id, versions = versions.len(), "chain of events read");
        Ok(serde_json::to_string(&versions)?)
    }

    /// Stamp the event, write the record and emit the notification.
    fn persist(
        &self,
        store: &mut CustodyStore<'_>,
        key: &RecordKey,
        mut record: CustodyRecord,
        caller: &CallerIdentity,
        op: Operation,
    ) -> Result<String, CustodyError> {
        record.event = self
            .recorder
            .create_event(caller.caller_id(), caller.role_name(), op.as_str())?;
        let json = store.write(key, &record)?;
        store.notify(op, &json)?;
        tracing::info!(
            asset_id = %key.asset_id(),
            caller = caller.caller_id(),
            role = caller.role_name(),
            operation = %op,
            status = %record.status,
            "transition applied"
        );
        tracing::debug!(record = %json, "record written");
        Ok(json)
    }

    /// Reject, or under the legacy policy only log, an excluded role.
    fn role_exclusion(
        &self,
        op: Operation,
        caller: &CallerIdentity,
        reason: &str,
    ) -> Result<(), CustodyError> {
        if self.policy.enforces_exclusions() {
            return Err(deny(op, caller, reason));
        }
        tracing::warn!(
            operation = %op,
            role = caller.role_name(),
            policy = %self.policy,
            "role exclusion not enforced"
        );
        Ok(())
    }
}

fn deny(op: Operation, caller: &CallerIdentity, reason: &str) -> CustodyError {
    tracing::warn!(
        operation = %op,
        caller = caller.caller_id(),
        role = caller.role_name(),
        reason,
        "transition denied"
    );
    CustodyError::Authorization(format!(
        "{reason} (caller {:?}, role {:?})",
        caller.caller_id(),
        caller.role_name()
    ))
}

fn require_custodian(
    op: Operation,
    caller: &CallerIdentity,
    record: &CustodyRecord,
) -> Result<(), CustodyError> {
    if !caller.is_custodian(&record.delivery_man) {
        return Err(deny(op, caller, "the caller must be the current custodian"));
    }
    Ok(())
}

fn require_status(
    op: Operation,
    record: &CustodyRecord,
    expected: CustodyStatus,
) -> Result<(), CustodyError> {
    if record.status != expected {
        tracing::warn!(
            operation = %op,
            asset_id = %record.id,
            status = %record.status,
            "status precondition unmet"
        );
        return Err(StateError::InvalidStatus {
            asset_id: record.id.to_string(),
            operation: op.as_str().to_string(),
            expected,
            actual: record.status,
        }
        .into());
    }
    Ok(())
}

fn do_transition(
    op: Operation,
    record: &mut CustodyRecord,
    to: CustodyStatus,
) -> Result<(), CustodyError> {
    if !record.status.can_transition_to(to) {
        return Err(StateError::InvalidStatus {
            asset_id: record.id.to_string(),
            operation: op.as_str().to_string(),
            expected: to,
            actual: record.status,
        }
        .into());
    }
    record.status = to;
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use dcot_core::Timestamp;
    use dcot_ledger::{InMemoryLedger, StaticIdentity};

    use crate::event::FixedClock;
    use crate::store::CUSTODY_OBJECT_TYPE;

    fn workflow(policy: RoleExclusionPolicy) -> CustodyWorkflow {
        let at = Timestamp::parse("2026-01-15T12:00:00Z").unwrap();
        CustodyWorkflow::new(policy, EventRecorder::new(Arc::new(FixedClock::new(at))))
    }

    fn caller(role: &str, uid: &str) -> CallerIdentity {
        CallerIdentity::new(role, uid)
    }

    fn run(
        wf: &CustodyWorkflow,
        ledger: &InMemoryLedger,
        who: &CallerIdentity,
        op: Operation,
        args: &[&str],
    ) -> Result<Option<String>, CustodyError> {
        let identity = StaticIdentity::with_role_and_uid(who.role_name(), who.caller_id());
        let mut tx = ledger.begin(identity);
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let out = wf.execute(op, &mut tx, who, &args);
        if out.is_ok() {
            ledger.commit(tx).unwrap();
        }
        out
    }

    /// Runs `op` as `role`/`uid` and expects it to succeed.
    fn ok(
        wf: &CustodyWorkflow,
        ledger: &InMemoryLedger,
        role: &str,
        uid: &str,
        op: Operation,
        args: &[&str],
    ) -> Option<String> {
        run(wf, ledger, &caller(role, uid), op, args).unwrap()
    }

    fn fail(
        wf: &CustodyWorkflow,
        ledger: &InMemoryLedger,
        role: &str,
        uid: &str,
        op: Operation,
        args: &[&str],
    ) -> CustodyError {
        run(wf, ledger, &caller(role, uid), op, args).unwrap_err()
    }

    fn create(wf: &CustodyWorkflow, ledger: &InMemoryLedger, uid: &str) -> String {
        let payload = run(
            wf,
            ledger,
            &caller("member", uid),
            Operation::InitNewChain,
            &[r#"{"trackingId":"TRK-1","documentId":"doc-1","weightOfParcel":1.5}"#],
        )
        .unwrap()
        .unwrap();
        CustodyRecord::from_json_bytes(payload.as_bytes())
            .unwrap()
            .id
            .to_string()
    }

    fn current(ledger: &InMemoryLedger, id: &str) -> CustodyRecord {
        let key = dcot_ledger::create_composite_key(CUSTODY_OBJECT_TYPE, &[id]).unwrap();
        CustodyRecord::from_json_bytes(&ledger.committed_value(&key).unwrap()).unwrap()
    }

    fn versions(ledger: &InMemoryLedger, id: &str) -> usize {
        let key = dcot_ledger::create_composite_key(CUSTODY_OBJECT_TYPE, &[id]).unwrap();
        ledger.history(&key).len()
    }

    /// Created by m1 and handed to m2 (TRANSFER_PENDING, deliveryMan m2).
    fn pending(wf: &CustodyWorkflow, ledger: &InMemoryLedger) -> String {
        let id = create(wf, ledger, "m1");
        ok(wf, ledger, "member", "m1", Operation::StartTransfer, &[&id, "m2"]);
        id
    }

    // ── Arity ────────────────────────────────────────────────────────

    #[test]
    fn wrong_arity_is_validation_error_without_write() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let id = create(&wf, &ledger, "m1");
        for op in Operation::all() {
            let too_many = vec!["x"; op.arity() + 1];
            let err = fail(&wf, &ledger, "administrator", "a1", *op, &too_many);
            assert_eq!(err.kind(), "VALIDATION_ERROR", "{op}");
            let err = fail(&wf, &ledger, "administrator", "a1", *op, &[]);
            assert_eq!(err.kind(), "VALIDATION_ERROR", "{op}");
        }
        assert_eq!(versions(&ledger, &id), 1);
        assert_eq!(ledger.height(), 1);
    }

    // ── initNewChain ─────────────────────────────────────────────────

    #[test]
    fn init_creates_in_custody_record() {
        let wf = workflow(RoleExclusionPolicy::Strict);
        let ledger = InMemoryLedger::new();
        let id = create(&wf, &ledger, "m1");
        let r = current(&ledger, &id);
        assert_eq!(r.status, CustodyStatus::InCustody);
        assert_eq!(r.delivery_man, "m1");
        assert_eq!(r.document_id, "doc-1");
        assert_eq!(r.event.operation, "initNewChain");
        assert_eq!(r.event.caller, "m1");
        assert_eq!(r.event.role, "member");
        assert_eq!(r.event.moment, "2026-01-15T12:00:00Z");
        let events = ledger.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "initNewChain");
        assert_eq!(
            events[0].payload,
            current(&ledger, &id).to_json_bytes().unwrap()
        );
    }

    #[test]
    fn init_ignores_server_assigned_fields_in_draft() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let payload = run(
            &wf,
            &ledger,
            &caller("member", "m1"),
            Operation::InitNewChain,
            &[r#"{"id":"forged","documentId":"d","status":"RELEASED","deliveryMan":"eve"}"#],
        )
        .unwrap()
        .unwrap();
        let r = CustodyRecord::from_json_bytes(payload.as_bytes()).unwrap();
        assert_ne!(r.id.as_str(), "forged");
        assert_eq!(r.status, CustodyStatus::InCustody);
        assert_eq!(r.delivery_man, "m1");
    }

    #[test]
    fn init_twice_gives_distinct_records() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let a = create(&wf, &ledger, "m1");
        let b = create(&wf, &ledger, "m1");
        assert_ne!(a, b);
        assert_eq!(versions(&ledger, &a), 1);
        assert_eq!(versions(&ledger, &b), 1);
    }

    #[test]
    fn init_requires_document_id() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let err = run(
            &wf,
            &ledger,
            &caller("member", "m1"),
            Operation::InitNewChain,
            &[r#"{"trackingId":"T"}"#],
        )
        .unwrap_err();
        assert_eq!(err.kind(), "VALIDATION_ERROR");
    }

    #[test]
    fn init_rejects_malformed_draft() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let err = fail(&wf, &ledger, "member", "m1", Operation::InitNewChain, &["{"]);
        assert_eq!(err.kind(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn init_requires_member() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        for role in ["administrator", "operator", "delivery_operator", ""] {
            let err = run(
                &wf,
                &ledger,
                &caller(role, "u1"),
                Operation::InitNewChain,
                &[r#"{"documentId":"d"}"#],
            )
            .unwrap_err();
            assert_eq!(err.kind(), "AUTHORIZATION_ERROR", "role {role:?}");
        }
        assert_eq!(ledger.height(), 0);
    }

    #[test]
    fn init_requires_caller_id() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let err = run(
            &wf,
            &ledger,
            &caller("member", ""),
            Operation::InitNewChain,
            &[r#"{"documentId":"d"}"#],
        )
        .unwrap_err();
        assert_eq!(err.kind(), "VALIDATION_ERROR");
    }

    // ── startTransfer ────────────────────────────────────────────────

    #[test]
    fn start_transfer_hands_over() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let id = pending(&wf, &ledger);
        let r = current(&ledger, &id);
        assert_eq!(r.status, CustodyStatus::TransferPending);
        assert_eq!(r.delivery_man, "m2");
        assert_eq!(r.event.operation, "startTransfer");
        assert_eq!(ledger.events().last().unwrap().name, "startTransfer");
    }

    #[test]
    fn start_transfer_returns_no_payload() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let id = create(&wf, &ledger, "m1");
        let out = ok(&wf, &ledger, "member", "m1", Operation::StartTransfer, &[&id, "m2"]);
        assert_eq!(out, None);
    }

    #[test]
    fn start_transfer_denied_to_administrator() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let id = create(&wf, &ledger, "m1");
        let err = run(
            &wf,
            &ledger,
            &caller("administrator", "m1"),
            Operation::StartTransfer,
            &[&id, "m2"],
        )
        .unwrap_err();
        assert_eq!(err.kind(), "AUTHORIZATION_ERROR");
    }

    #[test]
    fn start_transfer_requires_custodian() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let id = create(&wf, &ledger, "m1");
        let err = fail(&wf, &ledger, "member", "m9", Operation::StartTransfer, &[&id, "m2"]);
        assert_eq!(err.kind(), "AUTHORIZATION_ERROR");
        assert_eq!(current(&ledger, &id).delivery_man, "m1");
    }

    #[test]
    fn start_transfer_requires_in_custody() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let id = pending(&wf, &ledger);
        let err = fail(&wf, &ledger, "member", "m2", Operation::StartTransfer, &[&id, "m3"]);
        assert!(matches!(
            err,
            CustodyError::State(StateError::InvalidStatus {
                expected: CustodyStatus::InCustody,
                actual: CustodyStatus::TransferPending,
                ..
            })
        ));
    }

    #[test]
    fn start_transfer_rejects_empty_recipient() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let id = create(&wf, &ledger, "m1");
        let err = fail(&wf, &ledger, "member", "m1", Operation::StartTransfer, &[&id, ""]);
        assert_eq!(err.kind(), "VALIDATION_ERROR");
    }

    #[test]
    fn start_transfer_with_missing_role_fails_at_event() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let id = create(&wf, &ledger, "m1");
        let err = fail(&wf, &ledger, "", "m1", Operation::StartTransfer, &[&id, "m2"]);
        assert_eq!(err.kind(), "VALIDATION_ERROR");
        assert_eq!(current(&ledger, &id).status, CustodyStatus::InCustody);
    }

    // ── completeTransfer ─────────────────────────────────────────────

    #[test]
    fn complete_transfer_by_new_custodian() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let id = pending(&wf, &ledger);
        ok(&wf, &ledger, "delivery_operator", "m2", Operation::CompleteTransfer, &[&id]);
        let r = current(&ledger, &id);
        assert_eq!(r.status, CustodyStatus::InCustody);
        assert_eq!(r.delivery_man, "m2");
    }

    #[test]
    fn complete_transfer_strict_excludes_member_and_admin() {
        let wf = workflow(RoleExclusionPolicy::Strict);
        let ledger = InMemoryLedger::new();
        let id = pending(&wf, &ledger);
        for role in ["member", "administrator"] {
            let err = fail(&wf, &ledger, role, "m2", Operation::CompleteTransfer, &[&id]);
            assert_eq!(err.kind(), "AUTHORIZATION_ERROR");
        }
        assert_eq!(current(&ledger, &id).status, CustodyStatus::TransferPending);
    }

    #[test]
    fn complete_transfer_legacy_allows_member_custodian() {
        let wf = workflow(RoleExclusionPolicy::Legacy);
        let ledger = InMemoryLedger::new();
        let id = pending(&wf, &ledger);
        ok(&wf, &ledger, "member", "m2", Operation::CompleteTransfer, &[&id]);
        assert_eq!(current(&ledger, &id).status, CustodyStatus::InCustody);
    }

    #[test]
    fn complete_transfer_requires_custodian_and_pending() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let id = pending(&wf, &ledger);
        let err = fail(&wf, &ledger, "operator", "o1", Operation::CompleteTransfer, &[&id]);
        assert_eq!(err.kind(), "AUTHORIZATION_ERROR");

        ok(&wf, &ledger, "operator", "m2", Operation::CompleteTransfer, &[&id]);
        let err = fail(&wf, &ledger, "operator", "m2", Operation::CompleteTransfer, &[&id]);
        assert_eq!(err.kind(), "STATE_ERROR");
    }

    // ── commentChain ─────────────────────────────────────────────────

    #[test]
    fn comment_by_custodian_or_admin() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let id = pending(&wf, &ledger);
        ok(&wf, &ledger, "delivery_operator", "m2", Operation::CommentChain, &[&id, "on the way"]);
        assert_eq!(current(&ledger, &id).text, "on the way");
        ok(&wf, &ledger, "administrator", "a1", Operation::CommentChain, &[&id, "checked"]);
        let r = current(&ledger, &id);
        assert_eq!(r.text, "checked");
        assert_eq!(r.status, CustodyStatus::TransferPending);
        assert_eq!(r.event.role, "administrator");
    }

    #[test]
    fn comment_denied_to_stranger() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let id = create(&wf, &ledger, "m1");
        let err = fail(&wf, &ledger, "operator", "o1", Operation::CommentChain, &[&id, "x"]);
        assert_eq!(err.kind(), "AUTHORIZATION_ERROR");
    }

    #[test]
    fn comment_member_exclusion_depends_on_policy() {
        let ledger = InMemoryLedger::new();
        let strict = workflow(RoleExclusionPolicy::Strict);
        let id = create(&strict, &ledger, "m1");
        let err = fail(&strict, &ledger, "member", "m1", Operation::CommentChain, &[&id, "x"]);
        assert_eq!(err.kind(), "AUTHORIZATION_ERROR");

        let legacy = workflow(RoleExclusionPolicy::Legacy);
        ok(&legacy, &ledger, "member", "m1", Operation::CommentChain, &[&id, "x"]);
        assert_eq!(current(&ledger, &id).text, "x");
    }

    #[test]
    fn comment_on_released_record_keeps_status() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let id = create(&wf, &ledger, "m1");
        ok(&wf, &ledger, "administrator", "a1", Operation::TerminateChain, &[&id]);
        ok(&wf, &ledger, "administrator", "a1", Operation::CommentChain, &[&id, "archived"]);
        let r = current(&ledger, &id);
        assert_eq!(r.status, CustodyStatus::Released);
        assert_eq!(r.text, "archived");
    }

    // ── cancelTransfer ───────────────────────────────────────────────

    #[test]
    fn cancel_keeps_pending_custodian() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let id = pending(&wf, &ledger);
        ok(&wf, &ledger, "member", "m2", Operation::CancelTransfer, &[&id]);
        let r = current(&ledger, &id);
        assert_eq!(r.status, CustodyStatus::InCustody);
        assert_eq!(r.delivery_man, "m2");
    }

    #[test]
    fn cancel_by_administrator() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let id = pending(&wf, &ledger);
        ok(&wf, &ledger, "administrator", "a1", Operation::CancelTransfer, &[&id]);
        assert_eq!(current(&ledger, &id).status, CustodyStatus::InCustody);
    }

    #[test]
    fn cancel_rejected_for_previous_custodian_and_wrong_status() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let id = pending(&wf, &ledger);
        let err = fail(&wf, &ledger, "member", "m1", Operation::CancelTransfer, &[&id]);
        assert_eq!(err.kind(), "AUTHORIZATION_ERROR");

        let fresh = create(&wf, &ledger, "m1");
        let err = fail(&wf, &ledger, "member", "m1", Operation::CancelTransfer, &[&fresh]);
        assert_eq!(err.kind(), "STATE_ERROR");
    }

    // ── terminateChain ───────────────────────────────────────────────

    #[test]
    fn terminate_by_admin_or_non_member_custodian() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let a = create(&wf, &ledger, "m1");
        ok(&wf, &ledger, "administrator", "a1", Operation::TerminateChain, &[&a]);
        assert_eq!(current(&ledger, &a).status, CustodyStatus::Released);

        let b = pending(&wf, &ledger);
        ok(&wf, &ledger, "delivery_operator", "m2", Operation::CompleteTransfer, &[&b]);
        ok(&wf, &ledger, "delivery_operator", "m2", Operation::TerminateChain, &[&b]);
        assert_eq!(current(&ledger, &b).status, CustodyStatus::Released);
    }

    #[test]
    fn terminate_denied_to_member_and_operator() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let id = create(&wf, &ledger, "m1");
        for role in ["member", "operator"] {
            let err = fail(&wf, &ledger, role, "m1", Operation::TerminateChain, &[&id]);
            assert_eq!(err.kind(), "AUTHORIZATION_ERROR");
        }
        let err = fail(&wf, &ledger, "delivery_operator", "d9", Operation::TerminateChain, &[&id]);
        assert_eq!(err.kind(), "AUTHORIZATION_ERROR");
    }

    #[test]
    fn released_is_terminal() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let id = create(&wf, &ledger, "m1");
        let admin = caller("administrator", "a1");
        run(&wf, &ledger, &admin, Operation::TerminateChain, &[&id]).unwrap();
        assert_eq!(
            run(&wf, &ledger, &admin, Operation::TerminateChain, &[&id]).unwrap_err().kind(),
            "STATE_ERROR"
        );
        assert_eq!(
            run(&wf, &ledger, &admin, Operation::UpdateDocument, &[&id, "d2"]).unwrap_err().kind(),
            "STATE_ERROR"
        );
        assert_eq!(
            run(&wf, &ledger, &admin, Operation::CancelTransfer, &[&id]).unwrap_err().kind(),
            "STATE_ERROR"
        );
        let courier = "delivery_operator";
        let err = fail(&wf, &ledger, courier, "m1", Operation::StartTransfer, &[&id, "x"]);
        assert_eq!(err.kind(), "STATE_ERROR");
        assert_eq!(current(&ledger, &id).status, CustodyStatus::Released);
    }

    // ── updateDocument ───────────────────────────────────────────────

    #[test]
    fn update_document_by_admin_returns_record() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let id = create(&wf, &ledger, "m1");
        let args = [id.as_str(), "doc-2"];
        let payload = ok(&wf, &ledger, "administrator", "a1", Operation::UpdateDocument, &args)
            .unwrap();
        let r = CustodyRecord::from_json_bytes(payload.as_bytes()).unwrap();
        assert_eq!(r.document_id, "doc-2");
        assert_eq!(r.delivery_man, "m1");
        assert_eq!(current(&ledger, &id), r);
    }

    #[test]
    fn update_document_rules() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let id = pending(&wf, &ledger);
        let err = fail(&wf, &ledger, "member", "m2", Operation::UpdateDocument, &[&id, "d"]);
        assert_eq!(err.kind(), "AUTHORIZATION_ERROR");
        let err = fail(&wf, &ledger, "administrator", "a1", Operation::UpdateDocument, &[&id, "d"]);
        assert_eq!(err.kind(), "STATE_ERROR");
        let err = fail(&wf, &ledger, "administrator", "a1", Operation::UpdateDocument, &[&id, ""]);
        assert_eq!(err.kind(), "STATE_ERROR");
    }

    #[test]
    fn update_document_checks_record_before_new_document_id() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let admin = caller("administrator", "a1");

        let err = fail(&wf, &ledger, "member", "m1", Operation::UpdateDocument, &["ghost", ""]);
        assert!(err.is_not_found(), "{err}");

        let id = create(&wf, &ledger, "m1");
        let err = fail(&wf, &ledger, "member", "m1", Operation::UpdateDocument, &[&id, ""]);
        assert_eq!(err.kind(), "AUTHORIZATION_ERROR");

        let err = run(&wf, &ledger, &admin, Operation::UpdateDocument, &[&id, ""]).unwrap_err();
        assert_eq!(err.kind(), "VALIDATION_ERROR");
        assert_eq!(current(&ledger, &id).document_id, "doc-1");
    }

    // ── Queries ──────────────────────────────────────────────────────

    #[test]
    fn asset_details_for_permitted_roles_without_write() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let id = create(&wf, &ledger, "m1");
        for role in ["administrator", "operator", "delivery_operator"] {
            let payload = run(&wf, &ledger, &caller(role, "x"), Operation::GetAssetDetails, &[&id])
                .unwrap()
                .unwrap();
            let r = CustodyRecord::from_json_bytes(payload.as_bytes()).unwrap();
            assert_eq!(r, current(&ledger, &id));
        }
        let err = fail(&wf, &ledger, "member", "m1", Operation::GetAssetDetails, &[&id]);
        assert_eq!(err.kind(), "AUTHORIZATION_ERROR");
        assert_eq!(versions(&ledger, &id), 1);
        assert_eq!(ledger.events().len(), 1);
    }

    #[test]
    fn chain_of_events_lists_versions_oldest_first() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let id = pending(&wf, &ledger);
        ok(&wf, &ledger, "delivery_operator", "m2", Operation::CompleteTransfer, &[&id]);
        let payload = ok(&wf, &ledger, "administrator", "a1", Operation::GetChainOfEvents, &[&id])
            .unwrap();
        let chain: Vec<CustodyRecord> = serde_json::from_str(&payload).unwrap();
        let ops: Vec<&str> = chain.iter().map(|r| r.event.operation.as_str()).collect();
        assert_eq!(ops, vec!["initNewChain", "startTransfer", "completeTransfer"]);
    }

    #[test]
    fn chain_of_events_admin_only_and_not_found() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let id = create(&wf, &ledger, "m1");
        let err = fail(&wf, &ledger, "operator", "o1", Operation::GetChainOfEvents, &[&id]);
        assert_eq!(err.kind(), "AUTHORIZATION_ERROR");
        let err = fail(
            &wf,
            &ledger,
            "administrator",
            "a1",
            Operation::GetChainOfEvents,
            &["ghost"],
        );
        assert!(err.is_not_found());
    }

    // ── Missing assets ───────────────────────────────────────────────

    #[test]
    fn every_operation_on_missing_asset_is_not_found() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let cases: [(Operation, &str, Vec<&str>); 8] = [
            (Operation::StartTransfer, "member", vec!["ghost", "m2"]),
            (Operation::CompleteTransfer, "operator", vec!["ghost"]),
            (Operation::CommentChain, "administrator", vec!["ghost", "t"]),
            (Operation::CancelTransfer, "administrator", vec!["ghost"]),
            (Operation::TerminateChain, "administrator", vec!["ghost"]),
            (Operation::UpdateDocument, "administrator", vec!["ghost", "d"]),
            (Operation::GetAssetDetails, "administrator", vec!["ghost"]),
            (Operation::GetChainOfEvents, "administrator", vec!["ghost"]),
        ];
        for (op, role, args) in cases {
            let err = run(&wf, &ledger, &caller(role, "u1"), op, &args).unwrap_err();
            assert!(err.is_not_found(), "{op}: {err}");
        }
        assert_eq!(ledger.height(), 0);
    }

    #[test]
    fn empty_asset_id_is_validation_error() {
        let wf = CustodyWorkflow::default();
        let ledger = InMemoryLedger::new();
        let err = fail(&wf, &ledger, "administrator", "a1", Operation::GetAssetDetails, &[""]);
        assert_eq!(err.kind(), "VALIDATION_ERROR");
    }
}

//! In-memory persistence backend
//!
//! Keeps every table in one process-local store behind a single mutex. Each
//! write runs against a copy of the store that replaces the live state only
//! when the whole operation succeeds, which gives the same all-or-nothing
//! behavior as a database transaction. Used by tests and `cho.storage=memory`.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;

use cho_common::ChoError;
use cho_common::reference::{AGE_CATEGORIES, APPOINTMENT_CATEGORIES, BARANGAYS};

use crate::entity::{
    age_categories, appointment_categories, appointments, barangays, family_planning_reports,
    morbidity_reports, personal_access_tokens, report_statuses, report_submission_templates,
    report_submissions, service_data, users, women_of_reproductive_ages,
};
use crate::model::*;
use crate::traits::*;

#[derive(Clone, Debug, Default)]
struct Store {
    sequences: HashMap<&'static str, i64>,
    barangays: BTreeMap<i64, barangays::Model>,
    users: BTreeMap<i64, users::Model>,
    tokens: BTreeMap<i64, personal_access_tokens::Model>,
    templates: BTreeMap<i64, report_submission_templates::Model>,
    submissions: BTreeMap<i64, report_submissions::Model>,
    statuses: BTreeMap<i64, report_statuses::Model>,
    age_categories: BTreeMap<i64, age_categories::Model>,
    wra: Vec<women_of_reproductive_ages::Model>,
    family_planning: Vec<family_planning_reports::Model>,
    service_data: Vec<service_data::Model>,
    morbidity: Vec<morbidity_reports::Model>,
    appointment_categories: BTreeMap<i64, appointment_categories::Model>,
    appointments: BTreeMap<i64, appointments::Model>,
}

/// Context a detail row inherits from its status, submission and template
struct DetailContext<'a> {
    status: &'a report_statuses::Model,
    template: &'a report_submission_templates::Model,
    barangay: &'a barangays::Model,
}

impl Store {
    fn next_id(&mut self, table: &'static str) -> i64 {
        let id = self.sequences.entry(table).or_insert(0);
        *id += 1;
        *id
    }

    fn barangay_name(&self, id: Option<i64>) -> Option<String> {
        id.and_then(|id| self.barangays.get(&id)).map(|b| b.name.clone())
    }

    fn user_info(&self, m: &users::Model) -> anyhow::Result<UserInfo> {
        Ok(UserInfo {
            id: m.id,
            name: m.name.clone(),
            email: m.email.clone(),
            password: m.password.clone(),
            role: parse_column(&m.role)?,
            barangay_id: m.barangay_id,
            barangay_name: self.barangay_name(m.barangay_id),
            status: parse_column(&m.status)?,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }

    fn appointment_info(&self, m: &appointments::Model) -> anyhow::Result<AppointmentInfo> {
        Ok(AppointmentInfo {
            id: m.id,
            appointment_category_id: m.appointment_category_id,
            category_name: self
                .appointment_categories
                .get(&m.appointment_category_id)
                .map(|c| c.name.clone())
                .unwrap_or_default(),
            full_name: m.full_name.clone(),
            email: m.email.clone(),
            contact_number: m.contact_number.clone(),
            appointment_date: m.appointment_date,
            appointment_time: m.appointment_time,
            notes: m.notes.clone(),
            status: parse_column(&m.status)?,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }

    fn latest_status_of(&self, submission_id: i64) -> Option<&report_statuses::Model> {
        self.statuses
            .values()
            .filter(|s| s.report_submission_id == submission_id)
            .max_by_key(|s| s.id)
    }

    fn submission_row(&self, s: &report_submissions::Model) -> Option<SubmissionRow> {
        let template = self.templates.get(&s.report_submission_template_id)?;
        let barangay = self.barangays.get(&s.barangay_id)?;
        let status = self.latest_status_of(s.id);
        Some(SubmissionRow {
            id: s.id,
            report_submission_template_id: template.id,
            barangay_id: barangay.id,
            barangay_name: barangay.name.clone(),
            report_type: template.report_type.clone(),
            report_year: template.report_year,
            report_month: template.report_month,
            status: s.status.clone(),
            due_at: s.due_at,
            created_at: s.created_at,
            report_status_id: status.map(|st| st.id),
            report_status: status.map(|st| st.status.clone()),
            submitted_at: status.map(|st| st.submitted_at),
            submitted_by: status.map(|st| st.user_id),
        })
    }

    fn status_row(&self, st: &report_statuses::Model) -> Option<StatusRow> {
        let submission = self.submissions.get(&st.report_submission_id)?;
        let template = self.templates.get(&submission.report_submission_template_id)?;
        let barangay = self.barangays.get(&submission.barangay_id)?;
        let user = self.users.get(&st.user_id)?;
        Some(StatusRow {
            id: st.id,
            report_submission_id: submission.id,
            user_id: user.id,
            user_name: user.name.clone(),
            status: st.status.clone(),
            submitted_at: st.submitted_at,
            admin_note: st.admin_note.clone(),
            projected_population: st.projected_population,
            barangay_id: barangay.id,
            barangay_name: barangay.name.clone(),
            report_type: template.report_type.clone(),
            report_year: template.report_year,
            report_month: template.report_month,
            submission_status: submission.status.clone(),
            due_at: submission.due_at,
        })
    }

    fn detail_context(&self, report_status_id: i64) -> Option<DetailContext<'_>> {
        let status = self.statuses.get(&report_status_id)?;
        let submission = self.submissions.get(&status.report_submission_id)?;
        let template = self.templates.get(&submission.report_submission_template_id)?;
        let barangay = self.barangays.get(&submission.barangay_id)?;
        Some(DetailContext {
            status,
            template,
            barangay,
        })
    }

    fn age_category_name(&self, id: i64) -> String {
        self.age_categories
            .get(&id)
            .map(|c| c.name.clone())
            .unwrap_or_default()
    }

    fn age_category_map(&self) -> AgeCategoryMap {
        AgeCategoryMap::new(
            self.age_categories
                .values()
                .map(|c| (c.name.clone(), c.id)),
        )
    }

    fn insert_details(
        &mut self,
        report_status_id: i64,
        details: &ReportDetails,
        categories: &AgeCategoryMap,
    ) -> anyhow::Result<()> {
        match details {
            ReportDetails::M1 {
                wra,
                family_planning,
                service_data,
            } => {
                for entry in wra {
                    let row = women_of_reproductive_ages::Model {
                        id: self.next_id("women_of_reproductive_ages"),
                        report_status_id,
                        age_category_id: categories.resolve(&entry.age_category)?,
                        population: entry.population,
                        with_mfp_unmet_need: entry.with_mfp_unmet_need,
                        accept_any_mfp: entry.accept_any_mfp,
                    };
                    self.wra.push(row);
                }
                for entry in family_planning {
                    let row = family_planning_reports::Model {
                        id: self.next_id("family_planning_reports"),
                        report_status_id,
                        age_category_id: categories.resolve(&entry.age_category)?,
                        fp_method: entry.fp_method.clone(),
                        current_users_beginning: entry.current_users_beginning,
                        new_acceptors_previous_month: entry.new_acceptors_previous_month,
                        other_acceptors_present_month: entry.other_acceptors_present_month,
                        drop_outs_present_month: entry.drop_outs_present_month,
                        current_users_end: entry.current_users_end,
                        new_acceptors_present_month: entry.new_acceptors_present_month,
                    };
                    self.family_planning.push(row);
                }
                for entry in service_data {
                    let age_category_id = match &entry.age_category {
                        Some(name) => Some(categories.resolve(name)?),
                        None => None,
                    };
                    let row = service_data::Model {
                        id: self.next_id("service_data"),
                        report_status_id,
                        age_category_id,
                        service_name: entry.service_name.clone(),
                        indicator: entry.indicator.clone(),
                        male: entry.male,
                        female: entry.female,
                        remarks: entry.remarks.clone(),
                    };
                    self.service_data.push(row);
                }
            }
            ReportDetails::M2 { morbidity } => {
                for entry in morbidity {
                    let row = morbidity_reports::Model {
                        id: self.next_id("morbidity_reports"),
                        report_status_id,
                        age_category_id: categories.resolve(&entry.age_category)?,
                        disease_name: entry.disease_name.clone(),
                        male: entry.male,
                        female: entry.female,
                    };
                    self.morbidity.push(row);
                }
            }
        }
        Ok(())
    }

    /// Resolves and filters detail rows against `query`.
    fn details<M, R>(
        &self,
        rows: &[M],
        query: &DetailQuery,
        status_of: impl Fn(&M) -> i64,
        build: impl Fn(&M, &DetailContext<'_>) -> R,
    ) -> Vec<R>
    where
        R: DetailRow,
    {
        let mut out: Vec<R> = rows
            .iter()
            .filter_map(|m| {
                let ctx = self.detail_context(status_of(m))?;
                Some(build(m, &ctx))
            })
            .filter(|r| query.barangay_id.is_none_or(|id| r.barangay_id() == id))
            .filter(|r| query.year.is_none_or(|y| r.period().year == y))
            .filter(|r| query.accepts(r.period(), r.report_status()))
            .collect();
        out.sort_by(|a, b| b.period().cmp(&a.period()));
        out
    }
}

macro_rules! detail_header {
    ($m:expr, $ctx:expr) => {
        (
            $m.id,
            $ctx.status.id,
            $ctx.status.status.clone(),
            $ctx.barangay.id,
            $ctx.barangay.name.clone(),
            $ctx.template.report_year,
            $ctx.template.report_month,
        )
    };
}

/// Process-local persistence service
pub struct MemoryPersistService {
    store: Mutex<Store>,
}

impl Default for MemoryPersistService {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPersistService {
    /// An empty store with no reference data
    pub fn new() -> Self {
        Self {
            store: Mutex::new(Store::default()),
        }
    }

    /// A store holding the same reference rows the migrations seed
    pub fn seeded(now: NaiveDateTime) -> Self {
        let mut store = Store::default();
        for name in BARANGAYS {
            let id = store.next_id("barangays");
            store.barangays.insert(
                id,
                barangays::Model {
                    id,
                    name: name.to_string(),
                    created_at: now,
                    updated_at: now,
                },
            );
        }
        for name in AGE_CATEGORIES {
            let id = store.next_id("age_categories");
            store.age_categories.insert(
                id,
                age_categories::Model {
                    id,
                    name: name.to_string(),
                },
            );
        }
        for name in APPOINTMENT_CATEGORIES {
            let id = store.next_id("appointment_categories");
            store.appointment_categories.insert(
                id,
                appointment_categories::Model {
                    id,
                    name: name.to_string(),
                },
            );
        }
        Self {
            store: Mutex::new(store),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&Store) -> T) -> T {
        f(&self.store.lock())
    }

    /// Runs `f` against a copy of the store and publishes it only on success.
    fn transact<T>(&self, f: impl FnOnce(&mut Store) -> anyhow::Result<T>) -> anyhow::Result<T> {
        let mut live = self.store.lock();
        let mut draft = live.clone();
        let out = f(&mut draft)?;
        *live = draft;
        Ok(out)
    }
}

fn paginate<T>(items: Vec<T>, page_no: u64, page_size: u64) -> Page<T> {
    let total = items.len() as u64;
    if total == 0 {
        return Page::empty();
    }
    let page_no = page_no.max(1);
    let offset = ((page_no - 1) * page_size) as usize;
    let page_items = items
        .into_iter()
        .skip(offset)
        .take(page_size as usize)
        .collect();
    Page::new(total, page_no, page_size, page_items)
}

fn barangay_info(m: &barangays::Model) -> BarangayInfo {
    BarangayInfo {
        id: m.id,
        name: m.name.clone(),
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

fn token_info(m: &personal_access_tokens::Model) -> TokenInfo {
    TokenInfo {
        id: m.id,
        user_id: m.user_id,
        token_id: m.token_id.clone(),
        name: m.name.clone(),
        last_used_at: m.last_used_at,
        expires_at: m.expires_at,
        created_at: m.created_at,
    }
}

#[async_trait]
impl PersistenceService for MemoryPersistService {
    fn storage_mode(&self) -> StorageMode {
        StorageMode::Memory
    }

    async fn health_check(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

// ============================================================================
// BarangayPersistence implementation
// ============================================================================

#[async_trait]
impl BarangayPersistence for MemoryPersistService {
    async fn barangay_find_all(&self) -> anyhow::Result<Vec<BarangayInfo>> {
        let mut list: Vec<BarangayInfo> =
            self.read(|s| s.barangays.values().map(barangay_info).collect());
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }

    async fn barangay_find_by_id(&self, id: i64) -> anyhow::Result<Option<BarangayInfo>> {
        Ok(self.read(|s| s.barangays.get(&id).map(barangay_info)))
    }

    async fn barangay_find_by_name(&self, name: &str) -> anyhow::Result<Option<BarangayInfo>> {
        Ok(self.read(|s| {
            s.barangays
                .values()
                .find(|b| b.name.eq_ignore_ascii_case(name))
                .map(barangay_info)
        }))
    }

    async fn barangay_create(
        &self,
        name: &str,
        now: NaiveDateTime,
    ) -> anyhow::Result<BarangayInfo> {
        self.transact(|s| {
            if s.barangays.values().any(|b| b.name.eq_ignore_ascii_case(name)) {
                return Err(ChoError::validation("name", "The name has already been taken.").into());
            }
            let id = s.next_id("barangays");
            let model = barangays::Model {
                id,
                name: name.to_string(),
                created_at: now,
                updated_at: now,
            };
            let info = barangay_info(&model);
            s.barangays.insert(id, model);
            Ok(info)
        })
    }

    async fn barangay_update(
        &self,
        id: i64,
        name: &str,
        now: NaiveDateTime,
    ) -> anyhow::Result<Option<BarangayInfo>> {
        self.transact(|s| {
            if s
                .barangays
                .values()
                .any(|b| b.id != id && b.name.eq_ignore_ascii_case(name))
            {
                return Err(ChoError::validation("name", "The name has already been taken.").into());
            }
            Ok(s.barangays.get_mut(&id).map(|b| {
                b.name = name.to_string();
                b.updated_at = now;
                barangay_info(b)
            }))
        })
    }

    async fn barangay_is_referenced(&self, id: i64) -> anyhow::Result<bool> {
        Ok(self.read(|s| {
            s.users.values().any(|u| u.barangay_id == Some(id))
                || s.submissions.values().any(|r| r.barangay_id == id)
        }))
    }

    async fn barangay_delete(&self, id: i64) -> anyhow::Result<bool> {
        self.transact(|s| Ok(s.barangays.remove(&id).is_some()))
    }

    async fn age_category_find_all(&self) -> anyhow::Result<Vec<AgeCategoryInfo>> {
        Ok(self.read(|s| {
            s.age_categories
                .values()
                .map(|c| AgeCategoryInfo {
                    id: c.id,
                    name: c.name.clone(),
                })
                .collect()
        }))
    }
}

// ============================================================================
// UserPersistence implementation
// ============================================================================

#[async_trait]
impl UserPersistence for MemoryPersistService {
    async fn user_find_by_id(&self, id: i64) -> anyhow::Result<Option<UserInfo>> {
        self.read(|s| s.users.get(&id).map(|u| s.user_info(u)).transpose())
    }

    async fn user_find_by_email(&self, email: &str) -> anyhow::Result<Option<UserInfo>> {
        self.read(|s| {
            s.users
                .values()
                .find(|u| u.email == email)
                .map(|u| s.user_info(u))
                .transpose()
        })
    }

    async fn user_find_page(
        &self,
        query: &UserQuery,
        page_no: u64,
        page_size: u64,
    ) -> anyhow::Result<Page<UserInfo>> {
        let search = query.search.as_ref().map(|s| s.to_lowercase());
        let mut list = self.read(|s| {
            s.users
                .values()
                .filter(|u| query.role.is_none_or(|r| u.role == r.as_str()))
                .filter(|u| query.status.is_none_or(|st| u.status == st.as_str()))
                .filter(|u| query.barangay_id.is_none_or(|b| u.barangay_id == Some(b)))
                .filter(|u| {
                    search.as_ref().is_none_or(|needle| {
                        u.name.to_lowercase().contains(needle)
                            || u.email.to_lowercase().contains(needle)
                    })
                })
                .map(|u| s.user_info(u))
                .collect::<anyhow::Result<Vec<_>>>()
        })?;
        list.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(paginate(list, page_no, page_size))
    }

    async fn user_find_active_encoders(&self, barangay_id: i64) -> anyhow::Result<Vec<UserInfo>> {
        self.read(|s| {
            s.users
                .values()
                .filter(|u| {
                    u.barangay_id == Some(barangay_id)
                        && u.role == Role::Encoder.as_str()
                        && u.status == UserStatus::Active.as_str()
                })
                .map(|u| s.user_info(u))
                .collect()
        })
    }

    async fn user_create(&self, user: NewUser, now: NaiveDateTime) -> anyhow::Result<UserInfo> {
        self.transact(|s| {
            if s.users.values().any(|u| u.email == user.email) {
                return Err(
                    ChoError::validation("email", "The email has already been taken.").into(),
                );
            }
            let id = s.next_id("users");
            let model = users::Model {
                id,
                name: user.name,
                email: user.email,
                password: user.password_hash,
                role: user.role.as_str().to_string(),
                barangay_id: user.barangay_id,
                status: UserStatus::Active.as_str().to_string(),
                created_at: now,
                updated_at: now,
            };
            let info = s.user_info(&model)?;
            s.users.insert(id, model);
            Ok(info)
        })
    }

    async fn user_update(
        &self,
        id: i64,
        changes: UserChanges,
        now: NaiveDateTime,
    ) -> anyhow::Result<Option<UserInfo>> {
        self.transact(|s| {
            if s
                .users
                .values()
                .any(|u| u.id != id && u.email == changes.email)
            {
                return Err(
                    ChoError::validation("email", "The email has already been taken.").into(),
                );
            }
            let Some(user) = s.users.get_mut(&id) else {
                return Ok(None);
            };
            user.name = changes.name;
            user.email = changes.email;
            if let Some(hash) = changes.password_hash {
                user.password = hash;
            }
            user.role = changes.role.as_str().to_string();
            user.barangay_id = changes.barangay_id;
            user.updated_at = now;
            let model = user.clone();
            s.user_info(&model).map(Some)
        })
    }

    async fn user_disable(&self, id: i64, now: NaiveDateTime) -> anyhow::Result<Option<u64>> {
        self.transact(|s| {
            let Some(user) = s.users.get_mut(&id) else {
                return Ok(None);
            };
            user.status = UserStatus::Disabled.as_str().to_string();
            user.updated_at = now;
            let before = s.tokens.len();
            s.tokens.retain(|_, t| t.user_id != id);
            Ok(Some((before - s.tokens.len()) as u64))
        })
    }

    async fn token_create(&self, token: NewToken, now: NaiveDateTime) -> anyhow::Result<TokenInfo> {
        self.transact(|s| {
            let id = s.next_id("personal_access_tokens");
            let model = personal_access_tokens::Model {
                id,
                user_id: token.user_id,
                token_id: token.token_id,
                name: token.name,
                last_used_at: None,
                expires_at: token.expires_at,
                created_at: now,
            };
            let info = token_info(&model);
            s.tokens.insert(id, model);
            Ok(info)
        })
    }

    async fn token_find(&self, token_id: &str) -> anyhow::Result<Option<TokenInfo>> {
        Ok(self.read(|s| {
            s.tokens
                .values()
                .find(|t| t.token_id == token_id)
                .map(token_info)
        }))
    }

    async fn token_touch(&self, token_id: &str, now: NaiveDateTime) -> anyhow::Result<()> {
        self.transact(|s| {
            if let Some(token) = s.tokens.values_mut().find(|t| t.token_id == token_id) {
                token.last_used_at = Some(now);
            }
            Ok(())
        })
    }

    async fn token_delete(&self, token_id: &str) -> anyhow::Result<bool> {
        self.transact(|s| {
            let before = s.tokens.len();
            s.tokens.retain(|_, t| t.token_id != token_id);
            Ok(before != s.tokens.len())
        })
    }
}

// ============================================================================
// AppointmentPersistence implementation
// ============================================================================

#[async_trait]
impl AppointmentPersistence for MemoryPersistService {
    async fn appointment_category_find_all(&self) -> anyhow::Result<Vec<AppointmentCategoryInfo>> {
        Ok(self.read(|s| {
            s.appointment_categories
                .values()
                .map(|c| AppointmentCategoryInfo {
                    id: c.id,
                    name: c.name.clone(),
                })
                .collect()
        }))
    }

    async fn appointment_category_find_by_id(
        &self,
        id: i64,
    ) -> anyhow::Result<Option<AppointmentCategoryInfo>> {
        Ok(self.read(|s| {
            s.appointment_categories
                .get(&id)
                .map(|c| AppointmentCategoryInfo {
                    id: c.id,
                    name: c.name.clone(),
                })
        }))
    }

    async fn appointment_find_live(
        &self,
        email: &str,
        category_id: i64,
        date: NaiveDate,
    ) -> anyhow::Result<Option<AppointmentInfo>> {
        self.read(|s| {
            s.appointments
                .values()
                .find(|a| {
                    a.email.eq_ignore_ascii_case(email)
                        && a.appointment_category_id == category_id
                        && a.appointment_date == date
                        && a.status != AppointmentStatus::Cancelled.as_str()
                })
                .map(|a| s.appointment_info(a))
                .transpose()
        })
    }

    async fn appointment_create(
        &self,
        appointment: NewAppointment,
        now: NaiveDateTime,
    ) -> anyhow::Result<AppointmentInfo> {
        self.transact(|s| {
            let id = s.next_id("appointments");
            let model = appointments::Model {
                id,
                appointment_category_id: appointment.appointment_category_id,
                full_name: appointment.full_name,
                email: appointment.email,
                contact_number: appointment.contact_number,
                appointment_date: appointment.appointment_date,
                appointment_time: appointment.appointment_time,
                notes: appointment.notes,
                status: AppointmentStatus::Pending.as_str().to_string(),
                created_at: now,
                updated_at: now,
            };
            let info = s.appointment_info(&model)?;
            s.appointments.insert(id, model);
            Ok(info)
        })
    }

    async fn appointment_find_by_id(&self, id: i64) -> anyhow::Result<Option<AppointmentInfo>> {
        self.read(|s| {
            s.appointments
                .get(&id)
                .map(|a| s.appointment_info(a))
                .transpose()
        })
    }

    async fn appointment_find_page(
        &self,
        query: &AppointmentQuery,
        page_no: u64,
        page_size: u64,
    ) -> anyhow::Result<Page<AppointmentInfo>> {
        let mut list = self.read(|s| {
            s.appointments
                .values()
                .filter(|a| query.date.is_none_or(|d| a.appointment_date == d))
                .filter(|a| {
                    query
                        .category_id
                        .is_none_or(|c| a.appointment_category_id == c)
                })
                .filter(|a| query.status.is_none_or(|st| a.status == st.as_str()))
                .map(|a| s.appointment_info(a))
                .collect::<anyhow::Result<Vec<_>>>()
        })?;
        list.sort_by(|a, b| {
            a.appointment_date
                .cmp(&b.appointment_date)
                .then(a.appointment_time.cmp(&b.appointment_time))
                .then(a.id.cmp(&b.id))
        });
        Ok(paginate(list, page_no, page_size))
    }

    async fn appointment_update_status(
        &self,
        id: i64,
        status: AppointmentStatus,
        now: NaiveDateTime,
    ) -> anyhow::Result<Option<AppointmentInfo>> {
        self.transact(|s| {
            let Some(appointment) = s.appointments.get_mut(&id) else {
                return Ok(None);
            };
            appointment.status = status.as_str().to_string();
            appointment.updated_at = now;
            let model = appointment.clone();
            s.appointment_info(&model).map(Some)
        })
    }
}

// ============================================================================
// SubmissionPersistence implementation
// ============================================================================

#[async_trait]
impl SubmissionPersistence for MemoryPersistService {
    async fn template_exists(&self, year: i32, month: u32) -> anyhow::Result<bool> {
        Ok(self.read(|s| {
            s.templates
                .values()
                .any(|t| t.report_year == year && t.report_month == month as i32)
        }))
    }

    async fn submission_create_batch(
        &self,
        batch: NewSubmissionBatch,
    ) -> anyhow::Result<SubmissionBatch> {
        let year = batch.period.year;
        let month = batch.period.month;
        self.transact(|s| {
            if s
                .templates
                .values()
                .any(|t| t.report_year == year && t.report_month == month as i32)
            {
                return Err(ChoError::DuplicateTemplate { year, month }.into());
            }

            let barangay_ids: Vec<i64> = s.barangays.keys().copied().collect();
            let mut templates = Vec::with_capacity(ReportType::ALL.len());
            let mut submissions_created = 0u64;

            for report_type in ReportType::ALL {
                let template_id = s.next_id("report_submission_templates");
                let template = report_submission_templates::Model {
                    id: template_id,
                    admin_id: batch.admin_id,
                    report_type: report_type.as_str().to_string(),
                    report_month: month as i32,
                    report_year: year,
                    created_at: batch.created_at,
                };
                s.templates.insert(template_id, template);
                templates.push(TemplateInfo {
                    id: template_id,
                    admin_id: batch.admin_id,
                    report_type: *report_type,
                    report_year: year,
                    report_month: month as i32,
                    created_at: batch.created_at,
                });

                for barangay_id in &barangay_ids {
                    let id = s.next_id("report_submissions");
                    s.submissions.insert(
                        id,
                        report_submissions::Model {
                            id,
                            report_submission_template_id: template_id,
                            barangay_id: *barangay_id,
                            status: SubmissionStatus::Pending.as_str().to_string(),
                            due_at: batch.due_at,
                            created_at: batch.created_at,
                            updated_at: batch.created_at,
                        },
                    );
                    submissions_created += 1;
                }
            }

            Ok(SubmissionBatch {
                templates,
                submissions_created,
                due_at: batch.due_at,
            })
        })
    }

    async fn submission_find(
        &self,
        query: &SubmissionQuery,
    ) -> anyhow::Result<Vec<SubmissionRow>> {
        let mut rows: Vec<SubmissionRow> = self.read(|s| {
            s.submissions
                .values()
                .filter(|r| query.barangay_id.is_none_or(|b| r.barangay_id == b))
                .filter(|r| query.due_before.is_none_or(|d| r.due_at <= d))
                .filter(|r| {
                    query.statuses.is_empty()
                        || query.statuses.iter().any(|st| r.status == st.as_str())
                })
                .filter_map(|r| s.submission_row(r))
                .filter(|r| query.year.is_none_or(|y| r.report_year == y))
                .filter(|r| query.month.is_none_or(|m| r.report_month == m as i32))
                .filter(|r| {
                    query
                        .report_type
                        .is_none_or(|t| r.report_type == t.as_str())
                })
                .collect()
        });
        rows.sort_by(|a, b| {
            b.period()
                .cmp(&a.period())
                .then(a.barangay_name.cmp(&b.barangay_name))
                .then(a.report_type.cmp(&b.report_type))
        });
        Ok(rows)
    }

    async fn submission_find_by_id(&self, id: i64) -> anyhow::Result<Option<SubmissionRow>> {
        Ok(self.read(|s| s.submissions.get(&id).and_then(|r| s.submission_row(r))))
    }

    async fn submission_period_bounds(&self) -> anyhow::Result<PeriodBounds> {
        Ok(self.read(|s| {
            let periods = s.templates.values().map(|t| cho_common::ReportPeriod {
                year: t.report_year,
                month: t.report_month as u32,
            });
            PeriodBounds {
                min: periods.clone().min(),
                max: periods.max(),
            }
        }))
    }
}

// ============================================================================
// ReportPersistence implementation
// ============================================================================

#[async_trait]
impl ReportPersistence for MemoryPersistService {
    async fn report_submit(&self, bundle: SubmitBundle) -> anyhow::Result<Vec<SubmitOutcome>> {
        self.transact(|s| {
            let categories = s.age_category_map();
            let mut outcomes = Vec::with_capacity(bundle.entries.len());

            for entry in &bundle.entries {
                let submission = s
                    .submissions
                    .get(&entry.submission_id)
                    .cloned()
                    .ok_or_else(|| {
                        ChoError::NotFound(format!("report submission {}", entry.submission_id))
                    })?;

                let report_status_id = s.next_id("report_statuses");
                s.statuses.insert(
                    report_status_id,
                    report_statuses::Model {
                        id: report_status_id,
                        report_submission_id: submission.id,
                        user_id: bundle.user_id,
                        status: ReportStatusKind::Approved.as_str().to_string(),
                        submitted_at: bundle.submitted_at,
                        admin_note: None,
                        projected_population: bundle.projected_population,
                        created_at: bundle.submitted_at,
                        updated_at: bundle.submitted_at,
                    },
                );

                s.insert_details(report_status_id, &entry.details, &categories)?;

                let status = SubmissionStatus::resolve(bundle.submitted_at, submission.due_at);
                match s.submissions.get_mut(&submission.id) {
                    Some(live) if live.status == SubmissionStatus::Pending.as_str() => {
                        live.status = status.as_str().to_string();
                        live.updated_at = bundle.submitted_at;
                    }
                    _ => return Err(ChoError::AlreadySubmitted(submission.id).into()),
                }

                outcomes.push(SubmitOutcome {
                    submission_id: submission.id,
                    report_status_id,
                    status,
                });
            }

            Ok(outcomes)
        })
    }

    async fn status_find(&self, query: &StatusQuery) -> anyhow::Result<Vec<StatusRow>> {
        let mut rows: Vec<StatusRow> = self.read(|s| {
            s.statuses
                .values()
                .filter(|st| query.status.is_none_or(|k| st.status == k.as_str()))
                .filter_map(|st| s.status_row(st))
                .filter(|r| query.barangay_id.is_none_or(|b| r.barangay_id == b))
                .filter(|r| query.year.is_none_or(|y| r.report_year == y))
                .filter(|r| query.month.is_none_or(|m| r.report_month == m as i32))
                .collect()
        });
        rows.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn status_find_by_id(&self, id: i64) -> anyhow::Result<Option<StatusRow>> {
        Ok(self.read(|s| s.statuses.get(&id).and_then(|st| s.status_row(st))))
    }

    async fn status_submitted_bounds(
        &self,
        barangay_id: Option<i64>,
    ) -> anyhow::Result<SubmittedBounds> {
        Ok(self.read(|s| {
            let instants: Vec<NaiveDateTime> = s
                .statuses
                .values()
                .filter(|st| {
                    barangay_id.is_none_or(|b| {
                        s.submissions
                            .get(&st.report_submission_id)
                            .is_some_and(|r| r.barangay_id == b)
                    })
                })
                .map(|st| st.submitted_at)
                .collect();
            SubmittedBounds {
                earliest: instants.iter().min().copied(),
                latest: instants.iter().max().copied(),
            }
        }))
    }

    async fn status_review(
        &self,
        id: i64,
        status: ReportStatusKind,
        admin_note: Option<String>,
        now: NaiveDateTime,
    ) -> anyhow::Result<Option<StatusRow>> {
        self.transact(|s| {
            let Some(row) = s.statuses.get_mut(&id) else {
                return Ok(None);
            };
            row.status = status.as_str().to_string();
            row.admin_note = admin_note;
            row.updated_at = now;
            let model = row.clone();
            Ok(s.status_row(&model))
        })
    }

    async fn family_planning_find(
        &self,
        query: &DetailQuery,
    ) -> anyhow::Result<Vec<FamilyPlanningRow>> {
        Ok(self.read(|s| {
            s.details(
                &s.family_planning,
                query,
                |m| m.report_status_id,
                |m, ctx| {
                    let (id, report_status_id, report_status, barangay_id, barangay_name, report_year, report_month) =
                        detail_header!(m, ctx);
                    FamilyPlanningRow {
                        id,
                        report_status_id,
                        report_status,
                        barangay_id,
                        barangay_name,
                        report_year,
                        report_month,
                        age_category: s.age_category_name(m.age_category_id),
                        fp_method: m.fp_method.clone(),
                        current_users_beginning: m.current_users_beginning,
                        new_acceptors_previous_month: m.new_acceptors_previous_month,
                        other_acceptors_present_month: m.other_acceptors_present_month,
                        drop_outs_present_month: m.drop_outs_present_month,
                        current_users_end: m.current_users_end,
                        new_acceptors_present_month: m.new_acceptors_present_month,
                    }
                },
            )
        }))
    }

    async fn morbidity_find(&self, query: &DetailQuery) -> anyhow::Result<Vec<MorbidityRow>> {
        Ok(self.read(|s| {
            s.details(
                &s.morbidity,
                query,
                |m| m.report_status_id,
                |m, ctx| {
                    let (id, report_status_id, report_status, barangay_id, barangay_name, report_year, report_month) =
                        detail_header!(m, ctx);
                    MorbidityRow {
                        id,
                        report_status_id,
                        report_status,
                        barangay_id,
                        barangay_name,
                        report_year,
                        report_month,
                        age_category: s.age_category_name(m.age_category_id),
                        disease_name: m.disease_name.clone(),
                        male: m.male,
                        female: m.female,
                    }
                },
            )
        }))
    }

    async fn service_data_find(&self, query: &DetailQuery) -> anyhow::Result<Vec<ServiceDataRow>> {
        Ok(self.read(|s| {
            s.details(
                &s.service_data,
                query,
                |m| m.report_status_id,
                |m, ctx| {
                    let (id, report_status_id, report_status, barangay_id, barangay_name, report_year, report_month) =
                        detail_header!(m, ctx);
                    ServiceDataRow {
                        id,
                        report_status_id,
                        report_status,
                        barangay_id,
                        barangay_name,
                        report_year,
                        report_month,
                        age_category: m.age_category_id.map(|c| s.age_category_name(c)),
                        service_name: m.service_name.clone(),
                        indicator: m.indicator.clone(),
                        male: m.male,
                        female: m.female,
                        remarks: m.remarks.clone(),
                    }
                },
            )
        }))
    }

    async fn wra_find(&self, query: &DetailQuery) -> anyhow::Result<Vec<WraRow>> {
        Ok(self.read(|s| {
            s.details(
                &s.wra,
                query,
                |m| m.report_status_id,
                |m, ctx| {
                    let (id, report_status_id, report_status, barangay_id, barangay_name, report_year, report_month) =
                        detail_header!(m, ctx);
                    WraRow {
                        id,
                        report_status_id,
                        report_status,
                        barangay_id,
                        barangay_name,
                        report_year,
                        report_month,
                        age_category: s.age_category_name(m.age_category_id),
                        population: m.population,
                        with_mfp_unmet_need: m.with_mfp_unmet_need,
                        accept_any_mfp: m.accept_any_mfp,
                    }
                },
            )
        }))
    }
}

//! SQL-based persistence backend (MySQL/PostgreSQL via SeaORM)
//!
//! This module implements the `PersistenceService` trait directly over a
//! SeaORM `DatabaseConnection`. Joined read models are selected column by
//! column into the `FromQueryResult` structs of `crate::model`; multi-row
//! writes run inside explicit transactions.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::{prelude::Expr, *};

use cho_common::{ChoError, ReportPeriod};

use crate::entity::{
    age_categories, appointment_categories, appointments, barangays, family_planning_reports,
    morbidity_reports, personal_access_tokens, report_statuses, report_submission_templates,
    report_submissions, service_data, users, women_of_reproductive_ages,
};
use crate::model::*;
use crate::traits::*;

/// External database persistence service
///
/// Wraps a SeaORM `DatabaseConnection` and implements all persistence traits
/// by issuing queries directly.
pub struct ExternalDbPersistService {
    db: DatabaseConnection,
}

impl ExternalDbPersistService {
    /// Create a new ExternalDbPersistService with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Get a reference to the underlying database connection
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn barangay_info(m: barangays::Model) -> BarangayInfo {
    BarangayInfo {
        id: m.id,
        name: m.name,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

fn user_info(m: users::Model, barangay: Option<barangays::Model>) -> anyhow::Result<UserInfo> {
    Ok(UserInfo {
        id: m.id,
        name: m.name,
        email: m.email,
        password: m.password,
        role: parse_column(&m.role)?,
        barangay_id: m.barangay_id,
        barangay_name: barangay.map(|b| b.name),
        status: parse_column(&m.status)?,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn token_info(m: personal_access_tokens::Model) -> TokenInfo {
    TokenInfo {
        id: m.id,
        user_id: m.user_id,
        token_id: m.token_id,
        name: m.name,
        last_used_at: m.last_used_at,
        expires_at: m.expires_at,
        created_at: m.created_at,
    }
}

fn appointment_info(
    m: appointments::Model,
    category: Option<appointment_categories::Model>,
) -> anyhow::Result<AppointmentInfo> {
    Ok(AppointmentInfo {
        id: m.id,
        appointment_category_id: m.appointment_category_id,
        category_name: category.map(|c| c.name).unwrap_or_default(),
        full_name: m.full_name,
        email: m.email,
        contact_number: m.contact_number,
        appointment_date: m.appointment_date,
        appointment_time: m.appointment_time,
        notes: m.notes,
        status: parse_column(&m.status)?,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

/// Submission joined with template, barangay and its status row if any
fn submission_select() -> Select<report_submissions::Entity> {
    report_submissions::Entity::find()
        .select_only()
        .column(report_submissions::Column::Id)
        .column(report_submissions::Column::ReportSubmissionTemplateId)
        .column(report_submissions::Column::BarangayId)
        .column_as(barangays::Column::Name, "barangay_name")
        .column(report_submission_templates::Column::ReportType)
        .column(report_submission_templates::Column::ReportYear)
        .column(report_submission_templates::Column::ReportMonth)
        .column(report_submissions::Column::Status)
        .column(report_submissions::Column::DueAt)
        .column(report_submissions::Column::CreatedAt)
        .column_as(report_statuses::Column::Id, "report_status_id")
        .column_as(report_statuses::Column::Status, "report_status")
        .column(report_statuses::Column::SubmittedAt)
        .column_as(report_statuses::Column::UserId, "submitted_by")
        .join(JoinType::InnerJoin, report_submissions::Relation::Template.def())
        .join(JoinType::InnerJoin, report_submissions::Relation::Barangay.def())
        .join(
            JoinType::LeftJoin,
            report_submissions::Relation::ReportStatuses.def(),
        )
}

fn status_select() -> Select<report_statuses::Entity> {
    report_statuses::Entity::find()
        .select_only()
        .column(report_statuses::Column::Id)
        .column(report_statuses::Column::ReportSubmissionId)
        .column(report_statuses::Column::UserId)
        .column_as(users::Column::Name, "user_name")
        .column(report_statuses::Column::Status)
        .column(report_statuses::Column::SubmittedAt)
        .column(report_statuses::Column::AdminNote)
        .column(report_statuses::Column::ProjectedPopulation)
        .column(report_submissions::Column::BarangayId)
        .column_as(barangays::Column::Name, "barangay_name")
        .column(report_submission_templates::Column::ReportType)
        .column(report_submission_templates::Column::ReportYear)
        .column(report_submission_templates::Column::ReportMonth)
        .column_as(report_submissions::Column::Status, "submission_status")
        .column(report_submissions::Column::DueAt)
        .join(
            JoinType::InnerJoin,
            report_statuses::Relation::ReportSubmission.def(),
        )
        .join(JoinType::InnerJoin, report_statuses::Relation::User.def())
        .join(JoinType::InnerJoin, report_submissions::Relation::Template.def())
        .join(JoinType::InnerJoin, report_submissions::Relation::Barangay.def())
}

/// Adds the status/barangay/period labels and filters every detail fetch shares.
fn detail_select<E>(select: Select<E>, to_status: RelationDef, query: &DetailQuery) -> Select<E>
where
    E: EntityTrait,
{
    let mut select = select
        .column_as(report_statuses::Column::Status, "report_status")
        .column(report_submissions::Column::BarangayId)
        .column_as(barangays::Column::Name, "barangay_name")
        .column(report_submission_templates::Column::ReportYear)
        .column(report_submission_templates::Column::ReportMonth)
        .join(JoinType::InnerJoin, to_status)
        .join(
            JoinType::InnerJoin,
            report_statuses::Relation::ReportSubmission.def(),
        )
        .join(JoinType::InnerJoin, report_submissions::Relation::Template.def())
        .join(JoinType::InnerJoin, report_submissions::Relation::Barangay.def())
        .apply_if(query.barangay_id, |q, id| {
            q.filter(report_submissions::Column::BarangayId.eq(id))
        })
        .apply_if(query.year, |q, year| {
            q.filter(report_submission_templates::Column::ReportYear.eq(year))
        });

    // Narrow by year here; month bounds are applied after the fetch.
    if let Some((start, end)) = &query.range {
        select = select.filter(
            report_submission_templates::Column::ReportYear.between(start.year, end.year),
        );
    }
    if query.exclude_rejected {
        select = select
            .filter(report_statuses::Column::Status.ne(ReportStatusKind::Rejected.as_str()));
    }

    select
        .order_by_desc(report_submission_templates::Column::ReportYear)
        .order_by_desc(report_submission_templates::Column::ReportMonth)
        .order_by_asc(barangays::Column::Name)
}

fn keep_accepted<R: DetailRow>(rows: Vec<R>, query: &DetailQuery) -> Vec<R> {
    rows.into_iter()
        .filter(|r| query.accepts(r.period(), r.report_status()))
        .collect()
}

async fn insert_details<C>(
    db: &C,
    report_status_id: i64,
    details: &ReportDetails,
    categories: &AgeCategoryMap,
) -> anyhow::Result<()>
where
    C: ConnectionTrait,
{
    match details {
        ReportDetails::M1 {
            wra,
            family_planning,
            service_data: services,
        } => {
            let mut wra_rows = Vec::with_capacity(wra.len());
            for entry in wra {
                wra_rows.push(women_of_reproductive_ages::ActiveModel {
                    report_status_id: Set(report_status_id),
                    age_category_id: Set(categories.resolve(&entry.age_category)?),
                    population: Set(entry.population),
                    with_mfp_unmet_need: Set(entry.with_mfp_unmet_need),
                    accept_any_mfp: Set(entry.accept_any_mfp),
                    ..Default::default()
                });
            }
            if !wra_rows.is_empty() {
                women_of_reproductive_ages::Entity::insert_many(wra_rows)
                    .exec(db)
                    .await?;
            }

            let mut fp_rows = Vec::with_capacity(family_planning.len());
            for entry in family_planning {
                fp_rows.push(family_planning_reports::ActiveModel {
                    report_status_id: Set(report_status_id),
                    age_category_id: Set(categories.resolve(&entry.age_category)?),
                    fp_method: Set(entry.fp_method.clone()),
                    current_users_beginning: Set(entry.current_users_beginning),
                    new_acceptors_previous_month: Set(entry.new_acceptors_previous_month),
                    other_acceptors_present_month: Set(entry.other_acceptors_present_month),
                    drop_outs_present_month: Set(entry.drop_outs_present_month),
                    current_users_end: Set(entry.current_users_end),
                    new_acceptors_present_month: Set(entry.new_acceptors_present_month),
                    ..Default::default()
                });
            }
            if !fp_rows.is_empty() {
                family_planning_reports::Entity::insert_many(fp_rows)
                    .exec(db)
                    .await?;
            }

            let mut service_rows = Vec::with_capacity(services.len());
            for entry in services {
                let age_category_id = match &entry.age_category {
                    Some(name) => Some(categories.resolve(name)?),
                    None => None,
                };
                service_rows.push(service_data::ActiveModel {
                    report_status_id: Set(report_status_id),
                    age_category_id: Set(age_category_id),
                    service_name: Set(entry.service_name.clone()),
                    indicator: Set(entry.indicator.clone()),
                    male: Set(entry.male),
                    female: Set(entry.female),
                    remarks: Set(entry.remarks.clone()),
                    ..Default::default()
                });
            }
            if !service_rows.is_empty() {
                service_data::Entity::insert_many(service_rows)
                    .exec(db)
                    .await?;
            }
        }
        ReportDetails::M2 { morbidity } => {
            let mut rows = Vec::with_capacity(morbidity.len());
            for entry in morbidity {
                rows.push(morbidity_reports::ActiveModel {
                    report_status_id: Set(report_status_id),
                    age_category_id: Set(categories.resolve(&entry.age_category)?),
                    disease_name: Set(entry.disease_name.clone()),
                    male: Set(entry.male),
                    female: Set(entry.female),
                    ..Default::default()
                });
            }
            if !rows.is_empty() {
                morbidity_reports::Entity::insert_many(rows).exec(db).await?;
            }
        }
    }
    Ok(())
}

// ============================================================================
// PersistenceService implementation
// ============================================================================

#[async_trait]
impl PersistenceService for ExternalDbPersistService {
    fn storage_mode(&self) -> StorageMode {
        StorageMode::Sql
    }

    async fn health_check(&self) -> anyhow::Result<()> {
        // Execute a simple query to verify connectivity
        barangays::Entity::find()
            .select_only()
            .column_as(Expr::cust("1"), "health")
            .into_tuple::<i32>()
            .one(&self.db)
            .await?;
        Ok(())
    }
}

// ============================================================================
// BarangayPersistence implementation
// ============================================================================

#[async_trait]
impl BarangayPersistence for ExternalDbPersistService {
    async fn barangay_find_all(&self) -> anyhow::Result<Vec<BarangayInfo>> {
        Ok(barangays::Entity::find()
            .order_by_asc(barangays::Column::Name)
            .all(&self.db)
            .await?
            .into_iter()
            .map(barangay_info)
            .collect())
    }

    async fn barangay_find_by_id(&self, id: i64) -> anyhow::Result<Option<BarangayInfo>> {
        Ok(barangays::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(barangay_info))
    }

    async fn barangay_find_by_name(&self, name: &str) -> anyhow::Result<Option<BarangayInfo>> {
        Ok(barangays::Entity::find()
            .filter(barangays::Column::Name.eq(name))
            .one(&self.db)
            .await?
            .map(barangay_info))
    }

    async fn barangay_create(
        &self,
        name: &str,
        now: NaiveDateTime,
    ) -> anyhow::Result<BarangayInfo> {
        let entity = barangays::ActiveModel {
            name: Set(name.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        match entity.insert(&self.db).await {
            Ok(model) => Ok(barangay_info(model)),
            Err(e) if is_unique_violation(&e) => {
                Err(ChoError::validation("name", "The name has already been taken.").into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn barangay_update(
        &self,
        id: i64,
        name: &str,
        now: NaiveDateTime,
    ) -> anyhow::Result<Option<BarangayInfo>> {
        let Some(entity) = barangays::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let mut barangay: barangays::ActiveModel = entity.into();
        barangay.name = Set(name.to_string());
        barangay.updated_at = Set(now);

        match barangay.update(&self.db).await {
            Ok(model) => Ok(Some(barangay_info(model))),
            Err(e) if is_unique_violation(&e) => {
                Err(ChoError::validation("name", "The name has already been taken.").into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn barangay_is_referenced(&self, id: i64) -> anyhow::Result<bool> {
        let users = users::Entity::find()
            .filter(users::Column::BarangayId.eq(id))
            .count(&self.db)
            .await?;
        if users > 0 {
            return Ok(true);
        }

        let submissions = report_submissions::Entity::find()
            .filter(report_submissions::Column::BarangayId.eq(id))
            .count(&self.db)
            .await?;
        Ok(submissions > 0)
    }

    async fn barangay_delete(&self, id: i64) -> anyhow::Result<bool> {
        let result = barangays::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn age_category_find_all(&self) -> anyhow::Result<Vec<AgeCategoryInfo>> {
        Ok(age_categories::Entity::find()
            .order_by_asc(age_categories::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| AgeCategoryInfo {
                id: m.id,
                name: m.name,
            })
            .collect())
    }
}

// ============================================================================
// UserPersistence implementation
// ============================================================================

#[async_trait]
impl UserPersistence for ExternalDbPersistService {
    async fn user_find_by_id(&self, id: i64) -> anyhow::Result<Option<UserInfo>> {
        users::Entity::find_by_id(id)
            .find_also_related(barangays::Entity)
            .one(&self.db)
            .await?
            .map(|(user, barangay)| user_info(user, barangay))
            .transpose()
    }

    async fn user_find_by_email(&self, email: &str) -> anyhow::Result<Option<UserInfo>> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .find_also_related(barangays::Entity)
            .one(&self.db)
            .await?
            .map(|(user, barangay)| user_info(user, barangay))
            .transpose()
    }

    async fn user_find_page(
        &self,
        query: &UserQuery,
        page_no: u64,
        page_size: u64,
    ) -> anyhow::Result<Page<UserInfo>> {
        let mut select = users::Entity::find()
            .apply_if(query.role, |q, role| {
                q.filter(users::Column::Role.eq(role.as_str()))
            })
            .apply_if(query.status, |q, status| {
                q.filter(users::Column::Status.eq(status.as_str()))
            })
            .apply_if(query.barangay_id, |q, id| {
                q.filter(users::Column::BarangayId.eq(id))
            });

        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            select = select.filter(
                Condition::any()
                    .add(users::Column::Name.contains(search))
                    .add(users::Column::Email.contains(search)),
            );
        }

        let paginator = select
            .find_also_related(barangays::Entity)
            .order_by_asc(users::Column::Name)
            .order_by_asc(users::Column::Id)
            .paginate(&self.db, page_size.max(1));

        let total_count = paginator.num_items().await?;
        if total_count == 0 {
            return Ok(Page::empty());
        }

        let page_no = page_no.max(1);
        let page_items = paginator
            .fetch_page(page_no - 1)
            .await?
            .into_iter()
            .map(|(user, barangay)| user_info(user, barangay))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Page::new(total_count, page_no, page_size, page_items))
    }

    async fn user_find_active_encoders(&self, barangay_id: i64) -> anyhow::Result<Vec<UserInfo>> {
        users::Entity::find()
            .filter(users::Column::BarangayId.eq(barangay_id))
            .filter(users::Column::Role.eq(Role::Encoder.as_str()))
            .filter(users::Column::Status.eq(UserStatus::Active.as_str()))
            .find_also_related(barangays::Entity)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|(user, barangay)| user_info(user, barangay))
            .collect()
    }

    async fn user_create(&self, user: NewUser, now: NaiveDateTime) -> anyhow::Result<UserInfo> {
        let entity = users::ActiveModel {
            name: Set(user.name),
            email: Set(user.email),
            password: Set(user.password_hash),
            role: Set(user.role.as_str().to_string()),
            barangay_id: Set(user.barangay_id),
            status: Set(UserStatus::Active.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = match entity.insert(&self.db).await {
            Ok(model) => model,
            Err(e) if is_unique_violation(&e) => {
                return Err(
                    ChoError::validation("email", "The email has already been taken.").into(),
                );
            }
            Err(e) => return Err(e.into()),
        };

        let barangay = match model.barangay_id {
            Some(id) => barangays::Entity::find_by_id(id).one(&self.db).await?,
            None => None,
        };
        user_info(model, barangay)
    }

    async fn user_update(
        &self,
        id: i64,
        changes: UserChanges,
        now: NaiveDateTime,
    ) -> anyhow::Result<Option<UserInfo>> {
        let Some(entity) = users::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let mut user: users::ActiveModel = entity.into();
        user.name = Set(changes.name);
        user.email = Set(changes.email);
        if let Some(hash) = changes.password_hash {
            user.password = Set(hash);
        }
        user.role = Set(changes.role.as_str().to_string());
        user.barangay_id = Set(changes.barangay_id);
        user.updated_at = Set(now);

        match user.update(&self.db).await {
            Ok(_) => self.user_find_by_id(id).await,
            Err(e) if is_unique_violation(&e) => {
                Err(ChoError::validation("email", "The email has already been taken.").into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn user_disable(&self, id: i64, now: NaiveDateTime) -> anyhow::Result<Option<u64>> {
        let tx = self.db.begin().await?;

        let Some(entity) = users::Entity::find_by_id(id).one(&tx).await? else {
            return Ok(None);
        };

        let mut user: users::ActiveModel = entity.into();
        user.status = Set(UserStatus::Disabled.as_str().to_string());
        user.updated_at = Set(now);
        user.update(&tx).await?;

        let revoked = personal_access_tokens::Entity::delete_many()
            .filter(personal_access_tokens::Column::UserId.eq(id))
            .exec(&tx)
            .await?
            .rows_affected;

        tx.commit().await?;
        Ok(Some(revoked))
    }

    async fn token_create(&self, token: NewToken, now: NaiveDateTime) -> anyhow::Result<TokenInfo> {
        let entity = personal_access_tokens::ActiveModel {
            user_id: Set(token.user_id),
            token_id: Set(token.token_id),
            name: Set(token.name),
            last_used_at: Set(None),
            expires_at: Set(token.expires_at),
            created_at: Set(now),
            ..Default::default()
        };
        Ok(token_info(entity.insert(&self.db).await?))
    }

    async fn token_find(&self, token_id: &str) -> anyhow::Result<Option<TokenInfo>> {
        Ok(personal_access_tokens::Entity::find()
            .filter(personal_access_tokens::Column::TokenId.eq(token_id))
            .one(&self.db)
            .await?
            .map(token_info))
    }

    async fn token_touch(&self, token_id: &str, now: NaiveDateTime) -> anyhow::Result<()> {
        personal_access_tokens::Entity::update_many()
            .col_expr(
                personal_access_tokens::Column::LastUsedAt,
                Expr::value(Some(now)),
            )
            .filter(personal_access_tokens::Column::TokenId.eq(token_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn token_delete(&self, token_id: &str) -> anyhow::Result<bool> {
        let result = personal_access_tokens::Entity::delete_many()
            .filter(personal_access_tokens::Column::TokenId.eq(token_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

// ============================================================================
// AppointmentPersistence implementation
// ============================================================================

#[async_trait]
impl AppointmentPersistence for ExternalDbPersistService {
    async fn appointment_category_find_all(&self) -> anyhow::Result<Vec<AppointmentCategoryInfo>> {
        Ok(appointment_categories::Entity::find()
            .order_by_asc(appointment_categories::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| AppointmentCategoryInfo {
                id: m.id,
                name: m.name,
            })
            .collect())
    }

    async fn appointment_category_find_by_id(
        &self,
        id: i64,
    ) -> anyhow::Result<Option<AppointmentCategoryInfo>> {
        Ok(appointment_categories::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(|m| AppointmentCategoryInfo {
                id: m.id,
                name: m.name,
            }))
    }

    async fn appointment_find_live(
        &self,
        email: &str,
        category_id: i64,
        date: NaiveDate,
    ) -> anyhow::Result<Option<AppointmentInfo>> {
        appointments::Entity::find()
            .filter(appointments::Column::Email.eq(email))
            .filter(appointments::Column::AppointmentCategoryId.eq(category_id))
            .filter(appointments::Column::AppointmentDate.eq(date))
            .filter(appointments::Column::Status.ne(AppointmentStatus::Cancelled.as_str()))
            .find_also_related(appointment_categories::Entity)
            .one(&self.db)
            .await?
            .map(|(appointment, category)| appointment_info(appointment, category))
            .transpose()
    }

    async fn appointment_create(
        &self,
        appointment: NewAppointment,
        now: NaiveDateTime,
    ) -> anyhow::Result<AppointmentInfo> {
        let entity = appointments::ActiveModel {
            appointment_category_id: Set(appointment.appointment_category_id),
            full_name: Set(appointment.full_name),
            email: Set(appointment.email),
            contact_number: Set(appointment.contact_number),
            appointment_date: Set(appointment.appointment_date),
            appointment_time: Set(appointment.appointment_time),
            notes: Set(appointment.notes),
            status: Set(AppointmentStatus::Pending.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = entity.insert(&self.db).await?;
        let category = appointment_categories::Entity::find_by_id(model.appointment_category_id)
            .one(&self.db)
            .await?;
        appointment_info(model, category)
    }

    async fn appointment_find_by_id(&self, id: i64) -> anyhow::Result<Option<AppointmentInfo>> {
        appointments::Entity::find_by_id(id)
            .find_also_related(appointment_categories::Entity)
            .one(&self.db)
            .await?
            .map(|(appointment, category)| appointment_info(appointment, category))
            .transpose()
    }

    async fn appointment_find_page(
        &self,
        query: &AppointmentQuery,
        page_no: u64,
        page_size: u64,
    ) -> anyhow::Result<Page<AppointmentInfo>> {
        let paginator = appointments::Entity::find()
            .apply_if(query.date, |q, date| {
                q.filter(appointments::Column::AppointmentDate.eq(date))
            })
            .apply_if(query.category_id, |q, id| {
                q.filter(appointments::Column::AppointmentCategoryId.eq(id))
            })
            .apply_if(query.status, |q, status| {
                q.filter(appointments::Column::Status.eq(status.as_str()))
            })
            .find_also_related(appointment_categories::Entity)
            .order_by_asc(appointments::Column::AppointmentDate)
            .order_by_asc(appointments::Column::AppointmentTime)
            .order_by_asc(appointments::Column::Id)
            .paginate(&self.db, page_size.max(1));

        let total_count = paginator.num_items().await?;
        if total_count == 0 {
            return Ok(Page::empty());
        }

        let page_no = page_no.max(1);
        let page_items = paginator
            .fetch_page(page_no - 1)
            .await?
            .into_iter()
            .map(|(appointment, category)| appointment_info(appointment, category))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Page::new(total_count, page_no, page_size, page_items))
    }

    async fn appointment_update_status(
        &self,
        id: i64,
        status: AppointmentStatus,
        now: NaiveDateTime,
    ) -> anyhow::Result<Option<AppointmentInfo>> {
        let Some(entity) = appointments::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let mut appointment: appointments::ActiveModel = entity.into();
        appointment.status = Set(status.as_str().to_string());
        appointment.updated_at = Set(now);
        appointment.update(&self.db).await?;

        self.appointment_find_by_id(id).await
    }
}

// ============================================================================
// SubmissionPersistence implementation
// ============================================================================

#[async_trait]
impl SubmissionPersistence for ExternalDbPersistService {
    async fn template_exists(&self, year: i32, month: u32) -> anyhow::Result<bool> {
        let count = report_submission_templates::Entity::find()
            .filter(report_submission_templates::Column::ReportYear.eq(year))
            .filter(report_submission_templates::Column::ReportMonth.eq(month as i32))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn submission_create_batch(
        &self,
        batch: NewSubmissionBatch,
    ) -> anyhow::Result<SubmissionBatch> {
        let year = batch.period.year;
        let month = batch.period.month;

        let tx = self.db.begin().await?;

        // Re-checked under the transaction; the unique index is the final guard.
        let existing = report_submission_templates::Entity::find()
            .filter(report_submission_templates::Column::ReportYear.eq(year))
            .filter(report_submission_templates::Column::ReportMonth.eq(month as i32))
            .count(&tx)
            .await?;
        if existing > 0 {
            return Err(ChoError::DuplicateTemplate { year, month }.into());
        }

        let barangay_ids: Vec<i64> = barangays::Entity::find()
            .select_only()
            .column(barangays::Column::Id)
            .order_by_asc(barangays::Column::Id)
            .into_tuple()
            .all(&tx)
            .await?;

        let mut templates = Vec::with_capacity(ReportType::ALL.len());
        let mut submissions_created = 0u64;

        for report_type in ReportType::ALL {
            let template = report_submission_templates::ActiveModel {
                admin_id: Set(batch.admin_id),
                report_type: Set(report_type.as_str().to_string()),
                report_month: Set(month as i32),
                report_year: Set(year),
                created_at: Set(batch.created_at),
                ..Default::default()
            };
            let template = match template.insert(&tx).await {
                Ok(model) => model,
                Err(e) if is_unique_violation(&e) => {
                    return Err(ChoError::DuplicateTemplate { year, month }.into());
                }
                Err(e) => return Err(e.into()),
            };

            let rows: Vec<report_submissions::ActiveModel> = barangay_ids
                .iter()
                .map(|barangay_id| report_submissions::ActiveModel {
                    report_submission_template_id: Set(template.id),
                    barangay_id: Set(*barangay_id),
                    status: Set(SubmissionStatus::Pending.as_str().to_string()),
                    due_at: Set(batch.due_at),
                    created_at: Set(batch.created_at),
                    updated_at: Set(batch.created_at),
                    ..Default::default()
                })
                .collect();

            if !rows.is_empty() {
                submissions_created += rows.len() as u64;
                report_submissions::Entity::insert_many(rows)
                    .exec(&tx)
                    .await?;
            }

            templates.push(TemplateInfo {
                id: template.id,
                admin_id: template.admin_id,
                report_type: *report_type,
                report_year: template.report_year,
                report_month: template.report_month,
                created_at: template.created_at,
            });
        }

        tx.commit().await?;

        Ok(SubmissionBatch {
            templates,
            submissions_created,
            due_at: batch.due_at,
        })
    }

    async fn submission_find(
        &self,
        query: &SubmissionQuery,
    ) -> anyhow::Result<Vec<SubmissionRow>> {
        let mut select = submission_select()
            .apply_if(query.year, |q, year| {
                q.filter(report_submission_templates::Column::ReportYear.eq(year))
            })
            .apply_if(query.month, |q, month| {
                q.filter(report_submission_templates::Column::ReportMonth.eq(month as i32))
            })
            .apply_if(query.barangay_id, |q, id| {
                q.filter(report_submissions::Column::BarangayId.eq(id))
            })
            .apply_if(query.report_type, |q, report_type| {
                q.filter(report_submission_templates::Column::ReportType.eq(report_type.as_str()))
            })
            .apply_if(query.due_before, |q, due| {
                q.filter(report_submissions::Column::DueAt.lte(due))
            });

        if !query.statuses.is_empty() {
            select = select.filter(
                report_submissions::Column::Status
                    .is_in(query.statuses.iter().map(|s| s.as_str())),
            );
        }

        Ok(select
            .order_by_desc(report_submission_templates::Column::ReportYear)
            .order_by_desc(report_submission_templates::Column::ReportMonth)
            .order_by_asc(barangays::Column::Name)
            .order_by_asc(report_submission_templates::Column::ReportType)
            .into_model::<SubmissionRow>()
            .all(&self.db)
            .await?)
    }

    async fn submission_find_by_id(&self, id: i64) -> anyhow::Result<Option<SubmissionRow>> {
        Ok(submission_select()
            .filter(report_submissions::Column::Id.eq(id))
            .into_model::<SubmissionRow>()
            .one(&self.db)
            .await?)
    }

    async fn submission_period_bounds(&self) -> anyhow::Result<PeriodBounds> {
        let base = report_submission_templates::Entity::find()
            .select_only()
            .column(report_submission_templates::Column::ReportYear)
            .column(report_submission_templates::Column::ReportMonth);

        let min = base
            .clone()
            .order_by_asc(report_submission_templates::Column::ReportYear)
            .order_by_asc(report_submission_templates::Column::ReportMonth)
            .into_tuple::<(i32, i32)>()
            .one(&self.db)
            .await?;
        let max = base
            .order_by_desc(report_submission_templates::Column::ReportYear)
            .order_by_desc(report_submission_templates::Column::ReportMonth)
            .into_tuple::<(i32, i32)>()
            .one(&self.db)
            .await?;

        let to_period = |(year, month): (i32, i32)| ReportPeriod {
            year,
            month: month as u32,
        };
        Ok(PeriodBounds {
            min: min.map(to_period),
            max: max.map(to_period),
        })
    }
}

// ============================================================================
// ReportPersistence implementation
// ============================================================================

#[async_trait]
impl ReportPersistence for ExternalDbPersistService {
    async fn report_submit(&self, bundle: SubmitBundle) -> anyhow::Result<Vec<SubmitOutcome>> {
        let tx = self.db.begin().await?;

        let categories = AgeCategoryMap::new(
            age_categories::Entity::find()
                .all(&tx)
                .await?
                .into_iter()
                .map(|c| (c.name, c.id)),
        );

        let mut outcomes = Vec::with_capacity(bundle.entries.len());

        for entry in &bundle.entries {
            let submission = report_submissions::Entity::find_by_id(entry.submission_id)
                .one(&tx)
                .await?
                .ok_or_else(|| {
                    ChoError::NotFound(format!("report submission {}", entry.submission_id))
                })?;

            let status = report_statuses::ActiveModel {
                report_submission_id: Set(submission.id),
                user_id: Set(bundle.user_id),
                status: Set(ReportStatusKind::Approved.as_str().to_string()),
                submitted_at: Set(bundle.submitted_at),
                admin_note: Set(None),
                projected_population: Set(bundle.projected_population),
                created_at: Set(bundle.submitted_at),
                updated_at: Set(bundle.submitted_at),
                ..Default::default()
            }
            .insert(&tx)
            .await?;

            insert_details(&tx, status.id, &entry.details, &categories).await?;

            let resolved = SubmissionStatus::resolve(bundle.submitted_at, submission.due_at);
            let flipped = report_submissions::Entity::update_many()
                .col_expr(
                    report_submissions::Column::Status,
                    Expr::value(resolved.as_str()),
                )
                .col_expr(
                    report_submissions::Column::UpdatedAt,
                    Expr::value(bundle.submitted_at),
                )
                .filter(report_submissions::Column::Id.eq(submission.id))
                .filter(report_submissions::Column::Status.eq(SubmissionStatus::Pending.as_str()))
                .exec(&tx)
                .await?;

            if flipped.rows_affected == 0 {
                tracing::debug!(
                    submission_id = submission.id,
                    "submission left pending concurrently, rolling back"
                );
                return Err(ChoError::AlreadySubmitted(submission.id).into());
            }

            outcomes.push(SubmitOutcome {
                submission_id: submission.id,
                report_status_id: status.id,
                status: resolved,
            });
        }

        tx.commit().await?;
        Ok(outcomes)
    }

    async fn status_find(&self, query: &StatusQuery) -> anyhow::Result<Vec<StatusRow>> {
        Ok(status_select()
            .apply_if(query.year, |q, year| {
                q.filter(report_submission_templates::Column::ReportYear.eq(year))
            })
            .apply_if(query.month, |q, month| {
                q.filter(report_submission_templates::Column::ReportMonth.eq(month as i32))
            })
            .apply_if(query.barangay_id, |q, id| {
                q.filter(report_submissions::Column::BarangayId.eq(id))
            })
            .apply_if(query.status, |q, status| {
                q.filter(report_statuses::Column::Status.eq(status.as_str()))
            })
            .order_by_desc(report_statuses::Column::SubmittedAt)
            .order_by_desc(report_statuses::Column::Id)
            .into_model::<StatusRow>()
            .all(&self.db)
            .await?)
    }

    async fn status_find_by_id(&self, id: i64) -> anyhow::Result<Option<StatusRow>> {
        Ok(status_select()
            .filter(report_statuses::Column::Id.eq(id))
            .into_model::<StatusRow>()
            .one(&self.db)
            .await?)
    }

    async fn status_submitted_bounds(
        &self,
        barangay_id: Option<i64>,
    ) -> anyhow::Result<SubmittedBounds> {
        let submitted_at = Expr::col((
            report_statuses::Entity,
            report_statuses::Column::SubmittedAt,
        ));

        let bounds = report_statuses::Entity::find()
            .select_only()
            .column_as(submitted_at.clone().min(), "earliest")
            .column_as(submitted_at.max(), "latest")
            .join(
                JoinType::InnerJoin,
                report_statuses::Relation::ReportSubmission.def(),
            )
            .apply_if(barangay_id, |q, id| {
                q.filter(report_submissions::Column::BarangayId.eq(id))
            })
            .into_tuple::<(Option<NaiveDateTime>, Option<NaiveDateTime>)>()
            .one(&self.db)
            .await?;

        Ok(bounds
            .map(|(earliest, latest)| SubmittedBounds { earliest, latest })
            .unwrap_or_default())
    }

    async fn status_review(
        &self,
        id: i64,
        status: ReportStatusKind,
        admin_note: Option<String>,
        now: NaiveDateTime,
    ) -> anyhow::Result<Option<StatusRow>> {
        let Some(entity) = report_statuses::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let mut row: report_statuses::ActiveModel = entity.into();
        row.status = Set(status.as_str().to_string());
        row.admin_note = Set(admin_note);
        row.updated_at = Set(now);
        row.update(&self.db).await?;

        self.status_find_by_id(id).await
    }

    async fn family_planning_find(
        &self,
        query: &DetailQuery,
    ) -> anyhow::Result<Vec<FamilyPlanningRow>> {
        let select = family_planning_reports::Entity::find()
            .select_only()
            .column(family_planning_reports::Column::Id)
            .column(family_planning_reports::Column::ReportStatusId)
            .column_as(age_categories::Column::Name, "age_category")
            .column(family_planning_reports::Column::FpMethod)
            .column(family_planning_reports::Column::CurrentUsersBeginning)
            .column(family_planning_reports::Column::NewAcceptorsPreviousMonth)
            .column(family_planning_reports::Column::OtherAcceptorsPresentMonth)
            .column(family_planning_reports::Column::DropOutsPresentMonth)
            .column(family_planning_reports::Column::CurrentUsersEnd)
            .column(family_planning_reports::Column::NewAcceptorsPresentMonth)
            .join(
                JoinType::InnerJoin,
                family_planning_reports::Relation::AgeCategory.def(),
            );

        let rows = detail_select(
            select,
            family_planning_reports::Relation::ReportStatus.def(),
            query,
        )
        .into_model::<FamilyPlanningRow>()
        .all(&self.db)
        .await?;

        Ok(keep_accepted(rows, query))
    }

    async fn morbidity_find(&self, query: &DetailQuery) -> anyhow::Result<Vec<MorbidityRow>> {
        let select = morbidity_reports::Entity::find()
            .select_only()
            .column(morbidity_reports::Column::Id)
            .column(morbidity_reports::Column::ReportStatusId)
            .column_as(age_categories::Column::Name, "age_category")
            .column(morbidity_reports::Column::DiseaseName)
            .column(morbidity_reports::Column::Male)
            .column(morbidity_reports::Column::Female)
            .join(
                JoinType::InnerJoin,
                morbidity_reports::Relation::AgeCategory.def(),
            );

        let rows = detail_select(
            select,
            morbidity_reports::Relation::ReportStatus.def(),
            query,
        )
        .into_model::<MorbidityRow>()
        .all(&self.db)
        .await?;

        Ok(keep_accepted(rows, query))
    }

    async fn service_data_find(&self, query: &DetailQuery) -> anyhow::Result<Vec<ServiceDataRow>> {
        let select = service_data::Entity::find()
            .select_only()
            .column(service_data::Column::Id)
            .column(service_data::Column::ReportStatusId)
            .column_as(age_categories::Column::Name, "age_category")
            .column(service_data::Column::ServiceName)
            .column(service_data::Column::Indicator)
            .column(service_data::Column::Male)
            .column(service_data::Column::Female)
            .column(service_data::Column::Remarks)
            .join(
                JoinType::LeftJoin,
                service_data::Relation::AgeCategory.def(),
            );

        let rows = detail_select(select, service_data::Relation::ReportStatus.def(), query)
            .into_model::<ServiceDataRow>()
            .all(&self.db)
            .await?;

        Ok(keep_accepted(rows, query))
    }

    async fn wra_find(&self, query: &DetailQuery) -> anyhow::Result<Vec<WraRow>> {
        let select = women_of_reproductive_ages::Entity::find()
            .select_only()
            .column(women_of_reproductive_ages::Column::Id)
            .column(women_of_reproductive_ages::Column::ReportStatusId)
            .column_as(age_categories::Column::Name, "age_category")
            .column(women_of_reproductive_ages::Column::Population)
            .column(women_of_reproductive_ages::Column::WithMfpUnmetNeed)
            .column(women_of_reproductive_ages::Column::AcceptAnyMfp)
            .join(
                JoinType::InnerJoin,
                women_of_reproductive_ages::Relation::AgeCategory.def(),
            );

        let rows = detail_select(
            select,
            women_of_reproductive_ages::Relation::ReportStatus.def(),
            query,
        )
        .into_model::<WraRow>()
        .all(&self.db)
        .await?;

        Ok(keep_accepted(rows, query))
    }
}

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

use crate::api::availability::{
    AvailabilityQuery, AvailabilityResponse, AvailabilityState, DayLoad, MemberAvailability,
};
use crate::api::holiday::{ExportQuery, HolidayPayload, ImportSummary};
use crate::api::leave_request::{CreateLeave, LeaveFilter, LeaveListResponse, ReviewLeave};
use crate::api::report::{DashboardStats, DayAbsence, MemberMonthlyReport, MonthlyReport};
use crate::api::team::{CreateTeam, TeamDetail, TeamWithCount, UpdateTeam};
use crate::api::user::{CreateUser, UserListResponse, UserQuery};
use crate::auth::handlers::LoginResponse;
use crate::engine::availability::{Absentee, CriticalDay};
use crate::engine::notifications::{Notification, NotificationKind};
use crate::model::holiday::{Holiday, HolidayType};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};
use crate::model::role::Role;
use crate::model::team::Team;
use crate::model::user::User;
use crate::models::{LoginReq, RegisterReq};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "LeaveDesk API",
        version = "1.0.0",
        description = r#"
## Leave & Availability Service

Role-based leave management for employees, managers and HR.

### Key Features
- **Leave Requests**
  - Submit requests, approve/reject as a reviewer, list with filters
  - Approved vacation debits the requester's balance atomically
- **Company Holidays**
  - CRUD with duplicate detection, bulk import, CSV/JSON export
- **Team Availability**
  - Upcoming absences, per-day load, critical days, member status
- **Administration**
  - Teams and users, HR-only, with capability-based authorization

### Security
Endpoints are protected with **JWT Bearer authentication**; the role in the
token drives a capability set (review / manage holidays / manage users).

Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,

        crate::api::holiday::list_holidays,
        crate::api::holiday::create_holiday,
        crate::api::holiday::update_holiday,
        crate::api::holiday::delete_holiday,
        crate::api::holiday::import_holidays,
        crate::api::holiday::export_holidays,

        crate::api::team::list_teams,
        crate::api::team::get_team,
        crate::api::team::create_team,
        crate::api::team::update_team,
        crate::api::team::delete_team,

        crate::api::availability::team_availability,

        crate::api::user::create_user,
        crate::api::user::list_users,
        crate::api::user::get_user,
        crate::api::user::update_user,
        crate::api::user::delete_user,

        crate::api::notification::list_notifications,

        crate::api::report::dashboard_stats,
        crate::api::report::monthly_report
    ),
    components(
        schemas(
            Role,
            User,
            Team,
            LeaveType,
            LeaveStatus,
            LeaveRequest,
            HolidayType,
            Holiday,
            RegisterReq,
            LoginReq,
            LoginResponse,
            CreateLeave,
            ReviewLeave,
            LeaveFilter,
            LeaveListResponse,
            HolidayPayload,
            ImportSummary,
            ExportQuery,
            CreateTeam,
            UpdateTeam,
            TeamWithCount,
            TeamDetail,
            CreateUser,
            UserQuery,
            UserListResponse,
            AvailabilityQuery,
            AvailabilityResponse,
            DayLoad,
            MemberAvailability,
            AvailabilityState,
            CriticalDay,
            Absentee,
            Notification,
            NotificationKind,
            DashboardStats,
            MonthlyReport,
            MemberMonthlyReport,
            DayAbsence
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login, registration and token lifecycle"),
        (name = "Leave", description = "Leave request lifecycle APIs"),
        (name = "Holiday", description = "Company holiday calendar APIs"),
        (name = "Team", description = "Team administration APIs"),
        (name = "Availability", description = "Team availability projections"),
        (name = "User", description = "User administration APIs"),
        (name = "Notification", description = "Derived notification APIs"),
        (name = "Report", description = "Dashboard and monthly report APIs"),
    )
)]
pub struct ApiDoc;

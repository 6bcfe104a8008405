//! Registration, login and profile forms.

use std::sync::Arc;

use crate::api::ApiResult;
use crate::error::{ApiError, SubmitBlocked};
use crate::form::FormSession;
use crate::forms::{self, account};
use crate::model::{FavoriteLists, LoginRequest, ProfileUpdate, RegisterRequest, UserProfile};
use crate::session::{DEFAULT_ROLE, account_notice};
use crate::validate::{Clock, SystemClock, parse_date};

/// Birth dates go over the wire as a UTC midnight timestamp.
fn iso_midnight(form: &FormSession, name: &str) -> String {
    form.date(name)
        .map(|d| format!("{}T00:00:00.000Z", d.format("%Y-%m-%d")))
        .unwrap_or_default()
}

fn settle_form<T>(
    form: &mut FormSession,
    result: ApiResult<T>,
    notice: impl Fn(&ApiError) -> String,
) -> ApiResult<T> {
    match result {
        Ok(value) => {
            form.submit_succeeded();
            Ok(value)
        }
        Err(err) => {
            form.submit_failed(notice(&err));
            Err(err)
        }
    }
}

pub struct RegisterForm {
    form: FormSession,
}

impl RegisterForm {
    pub fn open() -> Self {
        Self::open_with_clock(Arc::new(SystemClock))
    }

    pub fn open_with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            form: FormSession::open_with_clock(
                forms::register_fields(),
                forms::register_cross(),
                &[],
                clock,
            ),
        }
    }

    pub fn form(&self) -> &FormSession {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormSession {
        &mut self.form
    }

    pub fn prepare_submit(&mut self) -> Result<RegisterRequest, SubmitBlocked> {
        self.form.begin_submit()?;
        Ok(RegisterRequest {
            first_name: self.form.text(account::FIRST_NAME),
            last_name: self.form.text(account::LAST_NAME),
            birth_date: iso_midnight(&self.form, account::BIRTH_DATE),
            email: self.form.text(account::EMAIL),
            password: self.form.value(account::PASSWORD).to_string(),
            role: DEFAULT_ROLE.to_string(),
        })
    }

    pub fn settle<T>(&mut self, result: ApiResult<T>) -> ApiResult<T> {
        settle_form(&mut self.form, result, account_notice)
    }

    pub fn cancel(&mut self) -> Result<(), SubmitBlocked> {
        self.form.cancel()
    }
}

pub struct LoginForm {
    form: FormSession,
}

impl LoginForm {
    pub fn open() -> Self {
        Self {
            form: FormSession::open_create(forms::login_fields(), Vec::new()),
        }
    }

    pub fn form(&self) -> &FormSession {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormSession {
        &mut self.form
    }

    pub fn prepare_submit(&mut self) -> Result<LoginRequest, SubmitBlocked> {
        self.form.begin_submit()?;
        Ok(LoginRequest {
            email: self.form.text(account::EMAIL),
            password: self.form.value(account::PASSWORD).to_string(),
        })
    }

    pub fn settle<T>(&mut self, result: ApiResult<T>) -> ApiResult<T> {
        settle_form(&mut self.form, result, account_notice)
    }
}

/// Profile editor seeded from the signed-in user.
pub struct ProfileEditor {
    user: UserProfile,
    form: FormSession,
}

impl ProfileEditor {
    pub fn open(user: &UserProfile) -> Self {
        Self::open_with_clock(user, Arc::new(SystemClock))
    }

    pub fn open_with_clock(user: &UserProfile, clock: Arc<dyn Clock>) -> Self {
        let birth = parse_date(&user.birth_date)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let values = [
            (account::FIRST_NAME, user.first_name.clone()),
            (account::LAST_NAME, user.last_name.clone()),
            (account::BIRTH_DATE, birth),
        ];
        Self {
            user: user.clone(),
            form: FormSession::open_with_clock(forms::profile_fields(), Vec::new(), &values, clock),
        }
    }

    pub fn form(&self) -> &FormSession {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormSession {
        &mut self.form
    }

    /// The server replaces the whole profile, so the current favorites ride
    /// along unchanged.
    pub fn prepare_submit(
        &mut self,
        favorites: FavoriteLists,
    ) -> Result<ProfileUpdate, SubmitBlocked> {
        self.form.begin_submit()?;
        if !self.form.is_dirty() {
            self.form.abort_submit();
            return Err(SubmitBlocked::NothingToSave);
        }
        Ok(ProfileUpdate {
            email: self.user.email.clone(),
            first_name: self.form.text(account::FIRST_NAME),
            last_name: self.form.text(account::LAST_NAME),
            birth_date: iso_midnight(&self.form, account::BIRTH_DATE),
            active: true,
            favorites,
        })
    }

    pub fn settle<T>(&mut self, result: ApiResult<T>) -> ApiResult<T> {
        settle_form(&mut self.form, result, account_notice)
    }

    pub fn cancel(&mut self) -> Result<(), SubmitBlocked> {
        self.form.cancel()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::validate::{FixedClock, ReasonCode};

    fn clock() -> Arc<dyn Clock> {
        let now = NaiveDate::from_ymd_opt(2026, 3, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("valid date");
        Arc::new(FixedClock(now))
    }

    #[test]
    fn register_builds_request_with_fixed_role() {
        let mut reg = RegisterForm::open_with_clock(clock());
        let form = reg.form_mut();
        form.set_value(account::FIRST_NAME, "Ana");
        form.set_value(account::LAST_NAME, "Pérez");
        form.set_value(account::BIRTH_DATE, "1990-05-04");
        form.set_value(account::EMAIL, "ana@example.com");
        form.set_value(account::PASSWORD, "Secreta1!");
        form.set_value(account::CONFIRM, "Secreta1!");
        let req = reg.prepare_submit().expect("valid form");
        assert_eq!(req.role, "user");
        assert_eq!(req.birth_date, "1990-05-04T00:00:00.000Z");
        assert!(reg.form().is_submitting());
    }

    #[test]
    fn register_blocks_on_mismatched_confirmation() {
        let mut reg = RegisterForm::open_with_clock(clock());
        let form = reg.form_mut();
        form.set_value(account::FIRST_NAME, "Ana");
        form.set_value(account::LAST_NAME, "Pérez");
        form.set_value(account::BIRTH_DATE, "1990-05-04");
        form.set_value(account::EMAIL, "ana@example.com");
        form.set_value(account::PASSWORD, "Secreta1!");
        form.set_value(account::CONFIRM, "Secreta2!");
        assert!(reg.form().has_reason(account::CONFIRM, ReasonCode::PasswordMatch));
        assert!(matches!(reg.prepare_submit(), Err(SubmitBlocked::Invalid { .. })));
    }
}

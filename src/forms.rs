//! Field layouts for every editor in the app.

use std::collections::BTreeSet;

use crate::cross_field::CrossValidator;
use crate::form::FieldSpec;
use crate::model::{GROUPS, POSITIONS};
use crate::validate::FieldValidator::{self, *};

pub mod team {
    pub const NAME: &str = "nombre";
    pub const COUNTRY: &str = "nombreCompletoPais";
    pub const FLAG: &str = "bandera";
    pub const INFO: &str = "informacion";
    pub const CODE: &str = "siglasEquipo";
    pub const GROUP: &str = "grupo";
    pub const RANKING: &str = "rankingFifa";
}

pub mod player {
    pub const FIRST_NAME: &str = "nombre";
    pub const LAST_NAME: &str = "apellido";
    pub const BIRTH_DATE: &str = "fechaNacimiento";
    pub const NUMBER: &str = "numeroCamiseta";
    pub const POSITION: &str = "posicion";
}

pub mod fixture {
    pub const TEAM_A: &str = "equipoA";
    pub const TEAM_B: &str = "equipoB";
    pub const DATE: &str = "fecha";
    pub const TIME: &str = "hora";
    pub const STADIUM: &str = "estadio";
    pub const CITY: &str = "ciudad";
    pub const STAGE: &str = "fase";
    pub const GROUP: &str = "grupo";
    pub const REFEREE: &str = "arbitroPrincipal";
}

pub mod score {
    pub const GOALS_A: &str = "golesEquipoA";
    pub const GOALS_B: &str = "golesEquipoB";
    pub const NOTE: &str = "nota";
}

pub mod account {
    pub const FIRST_NAME: &str = "nombre";
    pub const LAST_NAME: &str = "apellido";
    pub const BIRTH_DATE: &str = "fechaNacimiento";
    pub const EMAIL: &str = "correo";
    pub const PASSWORD: &str = "contra";
    pub const CONFIRM: &str = "confirmarContra";
}

fn name_rules(min: usize, max: usize) -> Vec<FieldValidator> {
    vec![Required, NameCharset, Length { min, max }]
}

/// Team editor. `siglasEquipo` is only offered on create; the update
/// endpoint does not accept it.
pub fn team_fields(creating: bool) -> Vec<FieldSpec> {
    let mut fields = vec![
        FieldSpec::new(team::NAME, name_rules(2, 50)),
        FieldSpec::new(team::COUNTRY, name_rules(2, 80)),
        FieldSpec::new(team::FLAG, vec![ImageUrl]),
        FieldSpec::new(team::INFO, vec![Length { min: 0, max: 500 }]),
        FieldSpec::new(team::GROUP, vec![Required, OneOf(GROUPS)]).with_default("A"),
        FieldSpec::new(team::RANKING, vec![Required, IntRange { min: 1, max: 211 }]),
    ];
    if creating {
        fields.insert(3, FieldSpec::new(team::CODE, vec![Required, TeamCode]));
    }
    fields
}

pub fn player_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new(player::FIRST_NAME, name_rules(2, 40)),
        FieldSpec::new(player::LAST_NAME, name_rules(2, 40)),
        FieldSpec::new(player::BIRTH_DATE, vec![Required, PastDate]),
        FieldSpec::new(player::NUMBER, vec![Required, IntRange { min: 1, max: 99 }]),
        FieldSpec::new(player::POSITION, vec![Required, OneOf(POSITIONS)]),
    ]
}

pub fn player_cross(taken: BTreeSet<u32>) -> Vec<CrossValidator> {
    vec![CrossValidator::JerseyNumberUnique {
        field: player::NUMBER,
        taken,
    }]
}

pub fn match_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new(fixture::TEAM_A, vec![Required]),
        FieldSpec::new(fixture::TEAM_B, vec![Required]),
        FieldSpec::new(fixture::DATE, vec![Required, FutureOrToday]),
        FieldSpec::new(fixture::TIME, vec![Required, TimeOfDay]),
        FieldSpec::new(fixture::STADIUM, vec![Required, Length { min: 2, max: 80 }]),
        FieldSpec::new(fixture::CITY, name_rules(2, 60)),
        FieldSpec::new(fixture::STAGE, vec![Required, Length { min: 2, max: 40 }])
            .with_default("Fase de grupos"),
        FieldSpec::new(fixture::GROUP, vec![OneOf(GROUPS)]),
        FieldSpec::new(fixture::REFEREE, name_rules(2, 60)),
    ]
}

pub fn match_cross() -> Vec<CrossValidator> {
    vec![
        CrossValidator::TeamRepeat {
            first: fixture::TEAM_A,
            second: fixture::TEAM_B,
        },
        CrossValidator::MatchTimeNotPast {
            date: fixture::DATE,
            time: fixture::TIME,
        },
    ]
}

pub fn score_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new(score::GOALS_A, vec![Required, IntRange { min: 0, max: 10 }])
            .with_default("0"),
        FieldSpec::new(score::GOALS_B, vec![Required, IntRange { min: 0, max: 10 }])
            .with_default("0"),
        FieldSpec::new(score::NOTE, vec![Length { min: 0, max: 200 }]),
    ]
}

pub fn register_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new(account::FIRST_NAME, name_rules(1, 30)),
        FieldSpec::new(account::LAST_NAME, name_rules(1, 40)),
        FieldSpec::new(account::BIRTH_DATE, vec![Required, PastDate]),
        FieldSpec::new(account::EMAIL, vec![Required, Email, Length { min: 0, max: 40 }]),
        FieldSpec::new(
            account::PASSWORD,
            vec![Required, StrongPassword, Length { min: 0, max: 25 }],
        ),
        FieldSpec::new(account::CONFIRM, vec![Required]),
    ]
}

pub fn register_cross() -> Vec<CrossValidator> {
    vec![CrossValidator::PasswordConfirmation {
        password: account::PASSWORD,
        confirm: account::CONFIRM,
    }]
}

pub fn login_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new(account::EMAIL, vec![Required, Email]),
        FieldSpec::new(account::PASSWORD, vec![Required]),
    ]
}

/// Profile editor; the e-mail is shown but not editable.
pub fn profile_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new(account::FIRST_NAME, name_rules(1, 30)),
        FieldSpec::new(account::LAST_NAME, name_rules(1, 40)),
        FieldSpec::new(account::BIRTH_DATE, vec![Required, PastDate]),
    ]
}

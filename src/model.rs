use serde::{Deserialize, Serialize};

pub const DEFAULT_TEAM_IMAGE: &str = "assets/img/equipos/default.jpg";

pub const STADIUM_IMAGES: &[&str] = &[
    "assets/img/estadios/estadio1.jpg",
    "assets/img/estadios/estadio2.jpg",
    "assets/img/estadios/estadio3.jpg",
    "assets/img/estadios/estadio4.jpg",
];

pub const GROUPS: &[&str] = &["A", "B", "C", "D", "E", "F", "G", "H", "I", "J"];

/// Alphabetical, the order the position select lists them in.
pub const POSITIONS: &[&str] = &[
    "Carrilero Derecho",
    "Carrilero Izquierdo",
    "Defensa Central",
    "Lateral Derecho",
    "Lateral Izquierdo",
    "Mediocentro",
    "Portero",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellido")]
    pub last_name: String,
    #[serde(rename = "fechaNacimiento", default)]
    pub birth_date: String,
    #[serde(rename = "numeroCamiseta")]
    pub shirt_number: u32,
    #[serde(rename = "posicion")]
    pub position: String,
}

impl Player {
    pub fn display_name(&self) -> String {
        format!("{} {} #{}", self.first_name, self.last_name, self.shirt_number)
    }
}

/// Player payload for the add-player endpoint (no id yet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlayer {
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellido")]
    pub last_name: String,
    #[serde(rename = "fechaNacimiento")]
    pub birth_date: String,
    #[serde(rename = "numeroCamiseta")]
    pub shirt_number: u32,
    #[serde(rename = "posicion")]
    pub position: String,
}

impl NewPlayer {
    pub fn with_id(&self, id: impl Into<String>) -> Player {
        Player {
            id: id.into(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            birth_date: self.birth_date.clone(),
            shirt_number: self.shirt_number,
            position: self.position.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "nombreCompletoPais")]
    pub country_name: String,
    #[serde(rename = "bandera", default)]
    pub flag_url: Option<String>,
    #[serde(rename = "informacion", default)]
    pub info: Option<String>,
    #[serde(rename = "siglasEquipo", default)]
    pub code: Option<String>,
    #[serde(rename = "grupo", default)]
    pub group: Option<String>,
    #[serde(rename = "rankingFifa", default)]
    pub fifa_ranking: Option<u32>,
    #[serde(rename = "fechaCreacion", default)]
    pub created_at: Option<String>,
    #[serde(rename = "jugadores", default)]
    pub players: Vec<Player>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTeam {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "nombreCompletoPais")]
    pub country_name: String,
    #[serde(rename = "bandera")]
    pub flag_url: String,
    #[serde(rename = "informacion")]
    pub info: String,
    #[serde(rename = "siglasEquipo")]
    pub code: String,
    #[serde(rename = "grupo")]
    pub group: String,
    #[serde(rename = "rankingFifa")]
    pub fifa_ranking: u32,
    #[serde(rename = "jugadores")]
    pub players: Vec<Player>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    #[default]
    #[serde(rename = "Programado")]
    Scheduled,
    #[serde(rename = "EnCurso")]
    InProgress,
    #[serde(rename = "Finalizado")]
    Finished,
    #[serde(other)]
    Unknown,
}

/// Team as embedded in a match payload; the server may send a trimmed copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRef {
    pub id: String,
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(rename = "siglasEquipo", default)]
    pub code: Option<String>,
    #[serde(rename = "bandera", default)]
    pub flag_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    #[serde(rename = "equipoA")]
    pub team_a: TeamRef,
    #[serde(rename = "equipoB")]
    pub team_b: TeamRef,
    #[serde(rename = "golesEquipoA", default)]
    pub goals_a: u32,
    #[serde(rename = "golesEquipoB", default)]
    pub goals_b: u32,
    /// Kickoff as `YYYY-MM-DDTHH:MM[:SS]`.
    #[serde(rename = "fecha")]
    pub kickoff: String,
    #[serde(rename = "estadio", default)]
    pub stadium: String,
    #[serde(rename = "ciudad", default)]
    pub city: String,
    #[serde(rename = "estado", default)]
    pub status: MatchStatus,
    #[serde(rename = "fase", default)]
    pub stage: String,
    #[serde(rename = "grupo", default)]
    pub group: String,
    #[serde(rename = "arbitroPrincipal", default)]
    pub referee: String,
    #[serde(rename = "fechaCreacion", default)]
    pub created_at: Option<String>,
    #[serde(rename = "fechaActualizacion", default)]
    pub updated_at: Option<String>,
}

impl Match {
    pub fn is_live(&self) -> bool {
        self.status == MatchStatus::InProgress
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMatch {
    #[serde(rename = "equipoAId")]
    pub team_a_id: String,
    #[serde(rename = "equipoBId")]
    pub team_b_id: String,
    #[serde(rename = "fecha")]
    pub kickoff: String,
    #[serde(rename = "estadio")]
    pub stadium: String,
    #[serde(rename = "ciudad")]
    pub city: String,
    #[serde(rename = "fase")]
    pub stage: String,
    #[serde(rename = "grupo")]
    pub group: String,
    #[serde(rename = "arbitroPrincipal")]
    pub referee: String,
}

/// Goal deltas applied on top of the current score, plus a scoring note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreUpdate {
    #[serde(rename = "golesEquipoA")]
    pub goals_a: u32,
    #[serde(rename = "golesEquipoB")]
    pub goals_b: u32,
    #[serde(rename = "nota")]
    pub note: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteLists {
    #[serde(rename = "partidos", default)]
    pub matches: Vec<String>,
    #[serde(rename = "equipos", default)]
    pub teams: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellido")]
    pub last_name: String,
    #[serde(rename = "fechaNacimiento", default)]
    pub birth_date: String,
    #[serde(rename = "correo")]
    pub email: String,
    #[serde(rename = "rol", default)]
    pub role: String,
    #[serde(rename = "fechaRegistro", default)]
    pub registered_at: String,
    #[serde(rename = "activo", default)]
    pub active: bool,
    #[serde(rename = "favoritos", default)]
    pub favorites: Option<FavoriteLists>,
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case("admin")
    }
}

/// Login/registration response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(rename = "usuario")]
    pub user: UserProfile,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellido")]
    pub last_name: String,
    #[serde(rename = "fechaNacimiento")]
    pub birth_date: String,
    #[serde(rename = "correo")]
    pub email: String,
    #[serde(rename = "contra")]
    pub password: String,
    #[serde(rename = "rol")]
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(rename = "correo")]
    pub email: String,
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellido")]
    pub last_name: String,
    #[serde(rename = "fechaNacimiento")]
    pub birth_date: String,
    #[serde(rename = "activo")]
    pub active: bool,
    #[serde(rename = "favoritos")]
    pub favorites: FavoriteLists,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FavoriteKind {
    Team,
    Match,
}

impl FavoriteKind {
    pub fn path_segment(self) -> &'static str {
        match self {
            FavoriteKind::Team => "equipos",
            FavoriteKind::Match => "partidos",
        }
    }
}

pub const COLLECTION_PETS: &str = "pets";
pub const COLLECTION_APPOINTMENTS: &str = "reminders";
pub const COLLECTION_MEDICAL_HISTORY: &str = "medicalHistory";
pub const COLLECTION_POSTS: &str = "posts";
pub const COLLECTION_CONTACTS: &str = "contacts";
pub const COLLECTION_WEIGHT_LOG: &str = "weightLog";
pub const COLLECTION_GROOMING: &str = "grooming";
pub const COLLECTION_USERS: &str = "users";

pub const FIELD_ID: &str = "id";
pub const FIELD_OWNER_ID: &str = "ownerId";
pub const FIELD_USER_ID: &str = "userId";
pub const FIELD_CREATED_AT: &str = "createdAt";
pub const FIELD_UPDATED_AT: &str = "updatedAt";

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_DISPLAY_NAME_LEN: usize = 2;
pub const MIN_SEARCH_TERM_LEN: usize = 2;
pub const MAX_FAILED_SIGN_IN_ATTEMPTS: i64 = 5;
pub const SIGN_IN_LOCKOUT_SECS: i64 = 300;

pub const COMPLETED_PREVIEW_LEN: usize = 5;
pub const CARE_CATEGORY_PREVIEW_LEN: usize = 3;
pub const DEFAULT_NEARBY_RADIUS_KM: f64 = 10.0;

pub const PIC_PET_MAX_SIZE_BYTES: usize = 6_000_000;
pub const ACCEPTED_IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpeg", "jpg", "heic", "webp"];

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

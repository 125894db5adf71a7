pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS document (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    data TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL,
    UNIQUE(collection, id)
);

CREATE INDEX IF NOT EXISTS idx_document_collection ON document(collection);

CREATE TABLE IF NOT EXISTS identity_account (
    uid TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    display_name TEXT,
    is_disabled BOOLEAN NOT NULL DEFAULT 0,
    failed_attempts INTEGER NOT NULL DEFAULT 0,
    locked_until TIMESTAMP,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL
);
"#;

pub const QUERY_INSERT_DOCUMENT: &str = r#"
INSERT INTO document(collection,id,data,created_at,updated_at) VALUES($1,$2,$3,$4,$4);
"#;

pub const QUERY_UPSERT_DOCUMENT: &str = r#"
INSERT INTO document(collection,id,data,created_at,updated_at) VALUES($1,$2,$3,$4,$4)
ON CONFLICT(collection,id) DO UPDATE SET data=excluded.data, updated_at=excluded.updated_at;
"#;

pub const QUERY_UPDATE_DOCUMENT_DATA: &str = r#"
UPDATE document SET data=$3, updated_at=$4 WHERE collection=$1 AND id=$2;
"#;

pub const QUERY_DELETE_DOCUMENT: &str = r#"
DELETE FROM document WHERE collection=$1 AND id=$2;
"#;

pub const QUERY_GET_DOCUMENT: &str = r#"
SELECT data FROM document WHERE collection=$1 AND id=$2;
"#;

pub const QUERY_GET_COLLECTION_DOCUMENTS: &str = r#"
SELECT data FROM document WHERE collection=$1 ORDER BY seq ASC;
"#;

pub const QUERY_INSERT_IDENTITY_ACCOUNT: &str = r#"
INSERT INTO identity_account(uid,email,password_hash,display_name,created_at,updated_at)
VALUES($1,$2,$3,$4,$5,$5);
"#;

pub const QUERY_GET_IDENTITY_ACCOUNT_BY_EMAIL: &str = r#"
SELECT
    uid,email,password_hash,display_name,is_disabled,locked_until
FROM identity_account
WHERE email=$1;
"#;

// reaching $3 failures locks the account until $4 and starts a new count
pub const QUERY_REGISTER_FAILED_ATTEMPT: &str = r#"
UPDATE identity_account SET
    failed_attempts = CASE WHEN failed_attempts + 1 >= $3 THEN 0 ELSE failed_attempts + 1 END,
    locked_until = CASE WHEN failed_attempts + 1 >= $3 THEN $4 ELSE locked_until END,
    updated_at=$2
WHERE uid=$1;
"#;

pub const QUERY_RESET_FAILED_ATTEMPTS: &str = r#"
UPDATE identity_account SET failed_attempts=0, locked_until=NULL, updated_at=$2 WHERE uid=$1;
"#;

pub const QUERY_SET_ACCOUNT_DISABLED: &str = r#"
UPDATE identity_account SET is_disabled=$2, updated_at=$3 WHERE email=$1;
"#;

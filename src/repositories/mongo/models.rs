#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoUserModel {
    pub id: i64,
    pub name: String,
    pub followers: Vec<i64>,
    pub created: String,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoPostModel {
    pub id: i64,
    pub description: String,
    pub author: i64,
    pub file: Option<MongoPostFileModel>,
    pub created: String,
    /// sort key, micros since epoch.
    pub created_at: i64,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoPostFileModel {
    pub key: String,
    pub url: String,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoCommentModel {
    pub id: i64,
    pub text: String,
    pub post: i64,
    pub author: i64,
    pub parent: Option<i64>,
    pub created: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoTagModel {
    pub id: i64,
    pub name: String,
    pub post: i64,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoReportModel {
    pub id: i64,
    pub reporter: i64,
    pub reported: i64,
    pub reason: i64,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoLikeModel {
    pub user: i64,
    pub kind: String,
    pub target: i64,
}

usecase! {
    register : {
        pub user_id: entities::UserId,
        pub name: String,
        pub created: entities::Date,
    } => {
        pub user: entities::User,
    }
}

usecase! {
    get : {
        pub user_id: entities::UserId,
    } => {
        pub profile: Profile,
    }
}

usecase! {
    follow : {
        pub user_id: entities::UserId,
        pub follower: entities::UserId,
    } => {
        pub user: entities::User,
    }
}

usecase! {
    unfollow : {
        pub user_id: entities::UserId,
        pub follower: entities::UserId,
    } => {
        pub user: entities::User,
    }
}

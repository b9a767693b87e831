use crate::usecases::user;

controller!(ReturnUserController for user {
    register, get, follow, unfollow,
});

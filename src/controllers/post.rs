use crate::usecases::post;

controller!(ReturnPostController for post {
    feed, get, likes, tags, create, update, delete, report, share, like,
});

use crate::usecases::comment;

controller!(ReturnCommentController for comment {
    list, create, update, delete, like,
});

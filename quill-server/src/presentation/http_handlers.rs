use crate::application::{AuthService, BlogService, CategoryService};
use crate::domain::category::SaveCategoryRequest;
use crate::domain::post::{CreatePostData, UpdatePostData, UploadedImage};
use crate::domain::user::{LoginUserRequest, RegisterUserRequest, UserResponse};
use crate::domain::DomainError;
use actix_multipart::Multipart;
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, Responder};
use futures::TryStreamExt;
use std::sync::Arc;

// Ответ логина: токен и данные пользователя
#[derive(serde::Serialize)]
struct AuthResponse {
    token: String,
    user: UserResponse,
}

#[derive(serde::Deserialize)]
pub struct CategoryQuery {
    pub name: Option<String>,
}

fn get_user_id_from_request(req: &HttpRequest) -> Result<i64, DomainError> {
    req.extensions()
        .get::<i64>()
        .copied()
        .ok_or(DomainError::Unauthorized(
            "User not authenticated".to_string(),
        ))
}

// Преобразование DomainError в HttpResponse
fn error_to_response(err: DomainError) -> HttpResponse {
    if let DomainError::Validation(errors) = &err {
        return HttpResponse::UnprocessableEntity()
            .json(serde_json::json!({ "errors": errors }));
    }

    let message = err.to_string();
    match err.to_status_code() {
        401 => HttpResponse::Unauthorized().json(serde_json::json!({ "error": message })),
        404 => HttpResponse::NotFound().json(serde_json::json!({ "error": message })),
        409 => HttpResponse::Conflict().json(serde_json::json!({ "error": message })),
        _ => HttpResponse::InternalServerError()
            .json(serde_json::json!({ "error": "Internal server error" })),
    }
}

// ============== Auth Handlers ==============

pub async fn register(
    auth_service: web::Data<Arc<AuthService>>,
    req: web::Json<RegisterUserRequest>,
) -> impl Responder {
    match auth_service.register(req.into_inner()).await {
        Ok(user) => HttpResponse::Created().json(user),
        Err(err) => error_to_response(err),
    }
}

pub async fn login(
    auth_service: web::Data<Arc<AuthService>>,
    req: web::Json<LoginUserRequest>,
) -> impl Responder {
    match auth_service.login(req.into_inner()).await {
        Ok((token, user)) => HttpResponse::Ok().json(AuthResponse { token, user }),
        Err(err) => error_to_response(err),
    }
}

pub async fn current_user(
    req: HttpRequest,
    auth_service: web::Data<Arc<AuthService>>,
) -> impl Responder {
    let user_id = match get_user_id_from_request(&req) {
        Ok(id) => id,
        Err(err) => return error_to_response(err),
    };

    match auth_service.current_user(user_id).await {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(err) => error_to_response(err),
    }
}

// ============== Category Handlers ==============

pub async fn list_categories(
    category_service: web::Data<Arc<CategoryService>>,
    query: web::Query<CategoryQuery>,
) -> impl Responder {
    match category_service.list(query.name.as_deref()).await {
        Ok(categories) => HttpResponse::Ok().json(categories),
        Err(err) => error_to_response(err),
    }
}

pub async fn get_category(
    category_service: web::Data<Arc<CategoryService>>,
    path: web::Path<i64>,
) -> impl Responder {
    match category_service.get(path.into_inner()).await {
        Ok(category) => HttpResponse::Ok().json(category),
        Err(err) => error_to_response(err),
    }
}

pub async fn create_category(
    category_service: web::Data<Arc<CategoryService>>,
    req: web::Json<SaveCategoryRequest>,
) -> impl Responder {
    match category_service.create(&req.name).await {
        Ok(category) => HttpResponse::Created().json(category),
        Err(err) => error_to_response(err),
    }
}

pub async fn update_category(
    category_service: web::Data<Arc<CategoryService>>,
    path: web::Path<i64>,
    req: web::Json<SaveCategoryRequest>,
) -> impl Responder {
    match category_service.update(path.into_inner(), &req.name).await {
        Ok(category) => HttpResponse::Ok().json(category),
        Err(err) => error_to_response(err),
    }
}

pub async fn delete_category(
    category_service: web::Data<Arc<CategoryService>>,
    path: web::Path<i64>,
) -> impl Responder {
    match category_service.delete(path.into_inner()).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => error_to_response(err),
    }
}

// ============== Post Handlers ==============

/// Fields of the multipart post form. The `image` part is a file upload
/// when it carries a filename; a bare text value is the client resending
/// the post's existing path, which leaves the stored file untouched.
#[derive(Debug, Default)]
struct PostForm {
    user_id: Option<i64>,
    title: String,
    content: String,
    category_id: Option<i64>,
    image: Option<UploadedImage>,
}

async fn read_post_form(mut payload: Multipart) -> Result<PostForm, actix_web::Error> {
    let mut form = PostForm::default();

    while let Some(mut field) = payload.try_next().await? {
        let name = field.name().to_string();
        let filename = field
            .content_disposition()
            .get_filename()
            .map(str::to_owned);

        let mut data = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            data.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "user_id" => form.user_id = parse_id(&data),
            "title" => form.title = field_text(&data),
            "content" => form.content = field_text(&data),
            "category_id" => form.category_id = parse_id(&data),
            "image" => {
                if let Some(filename) = filename {
                    if !data.is_empty() {
                        form.image = Some(UploadedImage {
                            filename,
                            bytes: data,
                        });
                    }
                }
            }
            other => {
                tracing::debug!("Ignoring unknown multipart field: {}", other);
            }
        }
    }

    Ok(form)
}

fn field_text(data: &[u8]) -> String {
    String::from_utf8_lossy(data).trim().to_string()
}

fn parse_id(data: &[u8]) -> Option<i64> {
    let text = field_text(data);
    if text.is_empty() {
        None
    } else {
        text.parse().ok()
    }
}

pub async fn create_post(
    blog_service: web::Data<Arc<BlogService>>,
    payload: Multipart,
) -> Result<HttpResponse, actix_web::Error> {
    let form = read_post_form(payload).await?;

    tracing::info!("Creating post for user_id={:?}", form.user_id);

    let data = CreatePostData {
        author_id: form.user_id,
        title: form.title,
        content: form.content,
        category_id: form.category_id,
        image: form.image,
    };

    Ok(match blog_service.create_post(data).await {
        Ok(post) => HttpResponse::Created().json(post),
        Err(err) => error_to_response(err),
    })
}

pub async fn list_posts(blog_service: web::Data<Arc<BlogService>>) -> impl Responder {
    match blog_service.list_posts().await {
        Ok(posts) => HttpResponse::Ok().json(posts),
        Err(err) => error_to_response(err),
    }
}

pub async fn update_post(
    blog_service: web::Data<Arc<BlogService>>,
    path: web::Path<i64>,
    payload: Multipart,
) -> Result<HttpResponse, actix_web::Error> {
    let post_id = path.into_inner();
    let form = read_post_form(payload).await?;

    tracing::info!("Updating post id={}", post_id);

    let data = UpdatePostData {
        title: form.title,
        content: form.content,
        category_id: form.category_id,
        image: form.image,
    };

    Ok(match blog_service.update_post(post_id, data).await {
        Ok(post) => HttpResponse::Ok().json(post),
        Err(err) => error_to_response(err),
    })
}

pub async fn delete_post(
    blog_service: web::Data<Arc<BlogService>>,
    path: web::Path<i64>,
) -> impl Responder {
    let post_id = path.into_inner();

    tracing::info!("Deleting post id={}", post_id);

    match blog_service.delete_post(post_id).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => error_to_response(err),
    }
}
